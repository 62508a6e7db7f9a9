//! PostgreSQL-backed [`DocumentStore`].

use async_trait::async_trait;
use sqlx::PgPool;
use draftline_core::types::DbId;

use crate::models::active_branch::ActiveBranch;
use crate::models::branch::{Branch, BranchUpdate, NewBranch};
use crate::models::document::{Document, NewDocument};
use crate::models::merge_event::{MergeEvent, MergeTransition, NewMergeEvent};
use crate::models::version::{HeadExpectation, NewVersion, Version};
use crate::repositories::{
    ActiveBranchRepo, BranchRepo, DocumentRepo, MergeEventRepo, VersionRepo,
};
use crate::store::{DocumentStore, StoreError};

/// Unique constraint guarding branch slugs within a document.
const BRANCH_SLUG_CONSTRAINT: &str = "uq_branches_document_slug";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a slug unique violation to [`StoreError::DuplicateSlug`].
fn slug_violation(err: sqlx::Error, slug: &str) -> StoreError {
    let is_slug_violation = err
        .as_database_error()
        .and_then(|db| db.constraint())
        .is_some_and(|c| c == BRANCH_SLUG_CONSTRAINT);
    if is_slug_violation {
        StoreError::DuplicateSlug {
            slug: slug.to_string(),
        }
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn create_document(
        &self,
        input: &NewDocument,
    ) -> Result<(Document, Branch), StoreError> {
        Ok(DocumentRepo::create_with_main(&self.pool, input).await?)
    }

    async fn find_document(&self, id: DbId) -> Result<Option<Document>, StoreError> {
        Ok(DocumentRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create_branch(&self, input: &NewBranch) -> Result<Branch, StoreError> {
        BranchRepo::create(&self.pool, input)
            .await
            .map_err(|e| slug_violation(e, &input.slug))
    }

    async fn find_branch(&self, id: DbId) -> Result<Option<Branch>, StoreError> {
        Ok(BranchRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_branch_by_slug(
        &self,
        document_id: DbId,
        slug: &str,
    ) -> Result<Option<Branch>, StoreError> {
        Ok(BranchRepo::find_by_slug(&self.pool, document_id, slug).await?)
    }

    async fn list_branches(&self, document_id: DbId) -> Result<Vec<Branch>, StoreError> {
        Ok(BranchRepo::list_by_document(&self.pool, document_id).await?)
    }

    async fn count_branches(&self, document_id: DbId) -> Result<i64, StoreError> {
        Ok(BranchRepo::count_by_document(&self.pool, document_id).await?)
    }

    async fn update_branch(
        &self,
        id: DbId,
        update: &BranchUpdate,
    ) -> Result<Option<Branch>, StoreError> {
        BranchRepo::update(&self.pool, id, update)
            .await
            .map_err(|e| slug_violation(e, update.slug.as_deref().unwrap_or_default()))
    }

    async fn delete_branch(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(BranchRepo::delete(&self.pool, id).await?)
    }

    async fn append_version(
        &self,
        input: &NewVersion,
        expected: HeadExpectation,
    ) -> Result<Version, StoreError> {
        let mut tx = self.pool.begin().await?;
        let version = VersionRepo::append(&mut tx, input, expected).await?;
        tx.commit().await?;
        Ok(version)
    }

    async fn find_version(&self, id: DbId) -> Result<Option<Version>, StoreError> {
        Ok(VersionRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_versions(
        &self,
        branch_id: DbId,
        limit: i64,
    ) -> Result<Vec<Version>, StoreError> {
        Ok(VersionRepo::list_by_branch(&self.pool, branch_id, limit).await?)
    }

    async fn count_versions(&self, branch_id: DbId) -> Result<i64, StoreError> {
        Ok(VersionRepo::count_by_branch(&self.pool, branch_id).await?)
    }

    async fn create_merge_event(&self, input: &NewMergeEvent) -> Result<MergeEvent, StoreError> {
        Ok(MergeEventRepo::create(&self.pool, input).await?)
    }

    async fn find_merge_event(&self, id: DbId) -> Result<Option<MergeEvent>, StoreError> {
        Ok(MergeEventRepo::find_by_id(&self.pool, id).await?)
    }

    async fn transition_merge_event(
        &self,
        id: DbId,
        transition: &MergeTransition,
    ) -> Result<Option<MergeEvent>, StoreError> {
        Ok(MergeEventRepo::transition(&self.pool, id, transition).await?)
    }

    async fn complete_merge_with_version(
        &self,
        id: DbId,
        transition: &MergeTransition,
        version: &NewVersion,
        expected: HeadExpectation,
    ) -> Result<Option<(MergeEvent, Version)>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let version = VersionRepo::append(&mut tx, version, expected).await?;
        let mut stamped = transition.clone();
        stamped.metadata.merged_version_id = Some(version.id);

        // Dropping the transaction rolls the append back.
        let Some(event) = MergeEventRepo::transition(&mut *tx, id, &stamped).await? else {
            tracing::debug!(
                merge_event_id = id,
                from = %transition.from,
                "Merge event already settled, rolling back merged version"
            );
            return Ok(None);
        };

        tx.commit().await?;
        tracing::debug!(
            merge_event_id = id,
            merged_version_id = version.id,
            branch_id = version.branch_id,
            "Merge completed with version"
        );
        Ok(Some((event, version)))
    }

    async fn list_merge_events(&self, document_id: DbId) -> Result<Vec<MergeEvent>, StoreError> {
        Ok(MergeEventRepo::list_by_document(&self.pool, document_id).await?)
    }

    async fn latest_completed_merge_between(
        &self,
        branch_a: DbId,
        branch_b: DbId,
    ) -> Result<Option<MergeEvent>, StoreError> {
        Ok(MergeEventRepo::latest_completed_between(&self.pool, branch_a, branch_b).await?)
    }

    async fn set_active_branch(
        &self,
        document_id: DbId,
        user_id: DbId,
        branch_id: DbId,
    ) -> Result<ActiveBranch, StoreError> {
        Ok(ActiveBranchRepo::upsert(&self.pool, document_id, user_id, branch_id).await?)
    }

    async fn find_active_branch(
        &self,
        document_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ActiveBranch>, StoreError> {
        Ok(ActiveBranchRepo::find(&self.pool, document_id, user_id).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}

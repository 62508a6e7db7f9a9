//! Transactional record store the engine is written against.
//!
//! [`DocumentStore`] is implemented by [`PgStore`](crate::pg::PgStore) for
//! production and [`MemoryStore`](crate::memory::MemoryStore) for tests and
//! database-less development. Every method is atomic on its own; the
//! compound methods (`create_document`, `append_version`,
//! `complete_merge_with_version`) group several writes into one
//! transaction.

use async_trait::async_trait;
use draftline_core::types::DbId;

use crate::models::active_branch::ActiveBranch;
use crate::models::branch::{Branch, BranchUpdate, NewBranch};
use crate::models::document::{Document, NewDocument};
use crate::models::merge_event::{MergeEvent, MergeTransition, NewMergeEvent};
use crate::models::version::{HeadExpectation, NewVersion, Version};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Branch {0} not found")]
    BranchNotFound(DbId),

    #[error("Conflicting write on branch {branch_id}: the branch head moved")]
    ConflictingWrite { branch_id: DbId },

    #[error("A branch with slug '{slug}' already exists in this document")]
    DuplicateSlug { slug: String },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // -- documents -----------------------------------------------------------

    /// Insert a document together with its `main` branch.
    async fn create_document(&self, input: &NewDocument)
        -> Result<(Document, Branch), StoreError>;

    async fn find_document(&self, id: DbId) -> Result<Option<Document>, StoreError>;

    // -- branches ------------------------------------------------------------

    async fn create_branch(&self, input: &NewBranch) -> Result<Branch, StoreError>;

    async fn find_branch(&self, id: DbId) -> Result<Option<Branch>, StoreError>;

    async fn find_branch_by_slug(
        &self,
        document_id: DbId,
        slug: &str,
    ) -> Result<Option<Branch>, StoreError>;

    /// All branches of a document, `main` first, then by creation order.
    async fn list_branches(&self, document_id: DbId) -> Result<Vec<Branch>, StoreError>;

    async fn count_branches(&self, document_id: DbId) -> Result<i64, StoreError>;

    /// Returns `None` if the branch does not exist.
    async fn update_branch(
        &self,
        id: DbId,
        update: &BranchUpdate,
    ) -> Result<Option<Branch>, StoreError>;

    /// Remove the branch row. Its versions stay readable. Returns `false`
    /// if nothing was deleted.
    async fn delete_branch(&self, id: DbId) -> Result<bool, StoreError>;

    // -- versions ------------------------------------------------------------

    /// Append a version after the branch head and advance the head, in one
    /// transaction. Concurrent appends on a branch are serialized.
    async fn append_version(
        &self,
        input: &NewVersion,
        expected: HeadExpectation,
    ) -> Result<Version, StoreError>;

    async fn find_version(&self, id: DbId) -> Result<Option<Version>, StoreError>;

    /// Newest-first, at most `limit` rows.
    async fn list_versions(&self, branch_id: DbId, limit: i64)
        -> Result<Vec<Version>, StoreError>;

    async fn count_versions(&self, branch_id: DbId) -> Result<i64, StoreError>;

    // -- merge events --------------------------------------------------------

    async fn create_merge_event(&self, input: &NewMergeEvent) -> Result<MergeEvent, StoreError>;

    async fn find_merge_event(&self, id: DbId) -> Result<Option<MergeEvent>, StoreError>;

    /// Apply `transition` if the event is still in `transition.from`.
    /// Returns `None` when the event is missing or its status has moved on.
    async fn transition_merge_event(
        &self,
        id: DbId,
        transition: &MergeTransition,
    ) -> Result<Option<MergeEvent>, StoreError>;

    /// Append `version` and apply `transition` in one transaction, stamping
    /// the new version id into the metadata's `merged_version_id`.
    ///
    /// Returns `None`, writing nothing, when the status compare-and-swap
    /// fails. Fails with [`StoreError::ConflictingWrite`], writing nothing,
    /// when the target head does not match `expected`.
    async fn complete_merge_with_version(
        &self,
        id: DbId,
        transition: &MergeTransition,
        version: &NewVersion,
        expected: HeadExpectation,
    ) -> Result<Option<(MergeEvent, Version)>, StoreError>;

    /// A document's merge events, newest first.
    async fn list_merge_events(&self, document_id: DbId) -> Result<Vec<MergeEvent>, StoreError>;

    /// The most recently settled `completed` merge between two branches, in
    /// either direction.
    async fn latest_completed_merge_between(
        &self,
        branch_a: DbId,
        branch_b: DbId,
    ) -> Result<Option<MergeEvent>, StoreError>;

    // -- active branch -------------------------------------------------------

    async fn set_active_branch(
        &self,
        document_id: DbId,
        user_id: DbId,
        branch_id: DbId,
    ) -> Result<ActiveBranch, StoreError>;

    async fn find_active_branch(
        &self,
        document_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ActiveBranch>, StoreError>;

    // -- health --------------------------------------------------------------

    async fn health_check(&self) -> Result<(), StoreError>;
}

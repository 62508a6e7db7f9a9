//! Version store: append-only chains per branch.

use draftline_core::error::CoreError;
use draftline_core::types::DbId;
use draftline_core::versioning::{clamp_limit, validate_word_count, word_count};
use draftline_db::models::version::{HeadExpectation, NewVersion, Version};

use crate::{Engine, EngineResult};

/// Content of a version about to be saved.
#[derive(Debug, Clone, Default)]
pub struct VersionDraft {
    pub content: String,
    pub crdt_state: Option<Vec<u8>>,
    /// Defaults to the whitespace-delimited word count of `content`.
    pub word_count: Option<i32>,
}

impl VersionDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, crdt_state: Vec<u8>) -> Self {
        self.crdt_state = Some(crdt_state);
        self
    }

    pub(crate) fn into_new_version(
        self,
        branch_id: DbId,
        author_id: DbId,
    ) -> Result<NewVersion, CoreError> {
        let word_count = match self.word_count {
            Some(count) => {
                validate_word_count(count)?;
                count
            }
            None => word_count(&self.content),
        };
        Ok(NewVersion {
            branch_id,
            content: self.content,
            crdt_state: self.crdt_state,
            word_count,
            author_id,
        })
    }
}

impl Engine {
    /// Append a version after the current head of `branch_id`.
    pub async fn append(
        &self,
        branch_id: DbId,
        draft: VersionDraft,
        author_id: DbId,
    ) -> EngineResult<Version> {
        self.save(branch_id, draft, author_id, HeadExpectation::Any)
            .await
    }

    /// Append only if the branch head is still `expected_head`.
    ///
    /// Fails with `ConflictingWrite` when another writer got there first.
    pub async fn append_if_head(
        &self,
        branch_id: DbId,
        draft: VersionDraft,
        author_id: DbId,
        expected_head: Option<DbId>,
    ) -> EngineResult<Version> {
        self.save(
            branch_id,
            draft,
            author_id,
            HeadExpectation::Exactly(expected_head),
        )
        .await
    }

    pub(crate) async fn save(
        &self,
        branch_id: DbId,
        draft: VersionDraft,
        author_id: DbId,
        expected: HeadExpectation,
    ) -> EngineResult<Version> {
        let input = draft.into_new_version(branch_id, author_id)?;
        let version = self.store.append_version(&input, expected).await?;

        tracing::info!(
            branch_id,
            version_id = version.id,
            seq = version.seq,
            author_id,
            "Version appended"
        );
        Ok(version)
    }

    /// Newest-first history of a branch.
    ///
    /// `limit` defaults to the configured page size and is clamped to
    /// `[1, max]`.
    pub async fn get_branch_versions(
        &self,
        branch_id: DbId,
        limit: Option<i64>,
    ) -> EngineResult<Vec<Version>> {
        self.require_branch(branch_id).await?;
        let limit = clamp_limit(
            limit,
            self.config.version_list_default_limit,
            self.config.version_list_max_limit,
        );
        let versions = self.store.list_versions(branch_id, limit).await?;

        tracing::debug!(branch_id, limit, count = versions.len(), "Listed versions");
        Ok(versions)
    }

    /// Any version by id, including versions of deleted branches.
    pub async fn get_version(&self, id: DbId) -> EngineResult<Version> {
        self.require_version(id).await
    }

    pub async fn count_versions(&self, branch_id: DbId) -> EngineResult<i64> {
        self.require_branch(branch_id).await?;
        Ok(self.store.count_versions(branch_id).await?)
    }

    /// The branch's current head, read through the head pointer.
    pub async fn get_branch_head(&self, branch_id: DbId) -> EngineResult<Option<Version>> {
        let branch = self.require_branch(branch_id).await?;
        self.head_of(&branch).await
    }
}

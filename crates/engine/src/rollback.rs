//! Rollback operator.

use draftline_core::error::CoreError;
use draftline_core::types::DbId;
use draftline_db::models::version::{HeadExpectation, Version};

use crate::versions::VersionDraft;
use crate::{Engine, EngineResult};

impl Engine {
    /// Restore `target_version_id` as the new head of `branch_id`.
    ///
    /// History is never rewritten: a new version copying the target's
    /// content, state, and word count is appended after the current head.
    pub async fn rollback(
        &self,
        branch_id: DbId,
        target_version_id: DbId,
        user_id: DbId,
    ) -> EngineResult<Version> {
        self.require_branch(branch_id).await?;
        let target = self.require_version(target_version_id).await?;
        if target.branch_id != branch_id {
            return Err(CoreError::VersionNotInBranch {
                version_id: target_version_id,
                branch_id,
            }
            .into());
        }

        let draft = VersionDraft {
            content: target.content,
            crdt_state: target.crdt_state,
            word_count: Some(target.word_count),
        };
        let version = self
            .save(branch_id, draft, user_id, HeadExpectation::Any)
            .await?;

        tracing::info!(
            branch_id,
            restored_version_id = target_version_id,
            version_id = version.id,
            user_id,
            "Branch rolled back"
        );
        Ok(version)
    }
}

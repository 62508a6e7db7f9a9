//! Comparison of a branch head with another branch's head or any version
//! of the same document.

use serde::{Deserialize, Serialize};
use draftline_core::diff::{line_stats, StateDiff};
use draftline_core::error::CoreError;
use draftline_core::types::DbId;
use draftline_db::models::version::Version;

use crate::{Engine, EngineResult};

/// What a branch is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffTarget {
    Branch(DbId),
    Version(DbId),
}

/// Summary of how the branch head (`source`) differs from the target.
#[derive(Debug, Clone, Serialize)]
pub struct BranchDiff {
    pub source_version: Version,
    pub target_version: Version,
    pub content_changed: bool,
    /// Source word count minus target word count.
    pub word_count_diff: i64,
    /// Lines present in the source but not the target.
    pub lines_added: usize,
    /// Lines present in the target but not the source.
    pub lines_removed: usize,
    pub state_diff: Option<StateDiff>,
}

impl BranchDiff {
    pub fn between(source_version: Version, target_version: Version) -> Self {
        let stats = line_stats(&target_version.content, &source_version.content);
        let state_diff = StateDiff::between(
            source_version.crdt_state.as_deref(),
            target_version.crdt_state.as_deref(),
        );
        Self {
            content_changed: source_version.content != target_version.content,
            word_count_diff: i64::from(source_version.word_count)
                - i64::from(target_version.word_count),
            lines_added: stats.lines_added,
            lines_removed: stats.lines_removed,
            state_diff,
            source_version,
            target_version,
        }
    }
}

impl Engine {
    pub async fn diff_branches(&self, branch_id: DbId, target: DiffTarget) -> EngineResult<BranchDiff> {
        let branch = self.require_branch(branch_id).await?;

        let target_version = match target {
            DiffTarget::Branch(other_id) => {
                let (_, other) = self.require_branch_pair(branch_id, other_id).await?;
                self.head_of(&other)
                    .await?
                    .ok_or(CoreError::NoVersionsToMerge { branch_id: other.id })?
            }
            DiffTarget::Version(version_id) => {
                let version = self.require_version(version_id).await?;
                if version.document_id != branch.document_id {
                    return Err(CoreError::InvalidBranchPair(format!(
                        "Version {version_id} belongs to document {}, branch {branch_id} to document {}",
                        version.document_id, branch.document_id
                    ))
                    .into());
                }
                version
            }
        };
        let source_version = self
            .head_of(&branch)
            .await?
            .ok_or(CoreError::NoVersionsToMerge { branch_id })?;

        let diff = BranchDiff::between(source_version, target_version);
        tracing::debug!(
            branch_id,
            target = ?target,
            content_changed = diff.content_changed,
            lines_added = diff.lines_added,
            lines_removed = diff.lines_removed,
            "Branch diff computed"
        );
        Ok(diff)
    }
}

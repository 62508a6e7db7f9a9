//! Version models.
//!
//! Versions are immutable once inserted. The store assigns `seq` and
//! `parent_version_id` from the branch head at insert time.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use draftline_core::ancestry::VersionLink;
use draftline_core::types::{DbId, Timestamp};

use crate::models::branch::VersionSummary;

/// A row from the `versions` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Version {
    pub id: DbId,
    pub document_id: DbId,
    pub branch_id: DbId,
    pub seq: i64,
    pub parent_version_id: Option<DbId>,
    pub content: String,
    #[serde(with = "draftline_core::encoding::optional_base64")]
    pub crdt_state: Option<Vec<u8>>,
    pub word_count: i32,
    pub author_id: DbId,
    pub created_at: Timestamp,
}

impl Version {
    pub fn link(&self) -> VersionLink {
        VersionLink {
            id: self.id,
            parent_version_id: self.parent_version_id,
        }
    }

    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            id: self.id,
            seq: self.seq,
            word_count: self.word_count,
            author_id: self.author_id,
            created_at: self.created_at,
        }
    }
}

/// Insert input for a version. The owning document is taken from the
/// branch row.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub branch_id: DbId,
    pub content: String,
    pub crdt_state: Option<Vec<u8>>,
    pub word_count: i32,
    pub author_id: DbId,
}

/// What the caller believes the branch head to be when appending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadExpectation {
    /// Append after whatever the head is at commit time.
    #[default]
    Any,
    /// Append only if the head is exactly this version (`None`: the branch
    /// must still be empty).
    Exactly(Option<DbId>),
}

impl HeadExpectation {
    pub fn admits(&self, head_version_id: Option<DbId>) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(expected) => *expected == head_version_id,
        }
    }
}

/// Request body for saving a version on a branch.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVersion {
    pub content: String,
    #[serde(default, with = "draftline_core::encoding::optional_base64")]
    pub crdt_state: Option<Vec<u8>>,
    pub word_count: Option<i32>,
    /// When present, the save only succeeds if this is still the head.
    pub expected_head_version_id: Option<DbId>,
    /// Optimistic save onto a branch that must have no versions yet.
    #[serde(default)]
    pub expect_empty_branch: bool,
}

impl CreateVersion {
    pub fn head_expectation(&self) -> HeadExpectation {
        match (self.expected_head_version_id, self.expect_empty_branch) {
            (Some(id), _) => HeadExpectation::Exactly(Some(id)),
            (None, true) => HeadExpectation::Exactly(None),
            (None, false) => HeadExpectation::Any,
        }
    }
}

/// Query parameters for listing a branch's versions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionListParams {
    pub limit: Option<i64>,
}

/// Request body for rolling a branch back to one of its versions.
#[derive(Debug, Clone, Deserialize)]
pub struct RollbackRequest {
    pub version_id: DbId,
}

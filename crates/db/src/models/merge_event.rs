//! Merge event models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use draftline_core::merge::{MergeMetadata, MergeStatus};
use draftline_core::types::{DbId, Timestamp};

/// A row from the `merge_events` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MergeEvent {
    pub id: DbId,
    pub document_id: DbId,
    pub source_branch_id: DbId,
    pub target_branch_id: DbId,
    pub initiator_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: MergeStatus,
    #[sqlx(json)]
    pub metadata: MergeMetadata,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl MergeEvent {
    /// Whether this merge joined `a` and `b`, in either direction.
    pub fn joins(&self, a: DbId, b: DbId) -> bool {
        (self.source_branch_id == a && self.target_branch_id == b)
            || (self.source_branch_id == b && self.target_branch_id == a)
    }
}

/// Insert input: new events always start `pending`.
#[derive(Debug, Clone)]
pub struct NewMergeEvent {
    pub document_id: DbId,
    pub source_branch_id: DbId,
    pub target_branch_id: DbId,
    pub initiator_id: DbId,
    pub metadata: MergeMetadata,
}

/// Compare-and-swap status change. Applies only while the event is still
/// in `from`; the metadata replaces the stored document.
#[derive(Debug, Clone)]
pub struct MergeTransition {
    pub from: MergeStatus,
    pub to: MergeStatus,
    pub metadata: MergeMetadata,
    pub resolved_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for initiating a merge.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMerge {
    pub source_branch_id: DbId,
    pub target_branch_id: DbId,
}

/// Request body for resolving a conflicted merge.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveMerge {
    pub content: String,
    #[serde(default, with = "draftline_core::encoding::optional_base64")]
    pub crdt_state: Option<Vec<u8>>,
    pub word_count: Option<i32>,
}

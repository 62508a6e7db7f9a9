//! Merge event lifecycle and three-way conflict assessment.
//!
//! A merge event moves `pending -> completed | conflicted | failed`, and a
//! conflicted event moves once more to `completed` when resolved. Nothing
//! else is legal; stores enforce it with a compare-and-swap on the status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::conflict::ConflictData;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    Pending,
    Completed,
    Failed,
    Conflicted,
}

impl MergeStatus {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Conflicted => "conflicted",
        }
    }

    /// Whether an event in this status may move to `next`.
    pub fn can_transition_to(&self, next: MergeStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Conflicted)
                | (Self::Pending, Self::Failed)
                | (Self::Conflicted, Self::Completed)
        )
    }
}

impl fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "conflicted" => Ok(Self::Conflicted),
            other => Err(CoreError::Validation(format!(
                "Unknown merge status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for MergeStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// How the two heads were compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Decoded CRDT states of source, target and ancestor, compared three-way.
    Crdt,
    /// Plain `content` of source and target compared two-way.
    Content,
}

/// What a merge did, or has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeKind {
    /// Only the source changed: target receives a copy of the source head.
    FastForward,
    /// The target already reflects every change; nothing is written.
    UpToDate,
    /// Both sides changed independently; needs manual resolution.
    Conflict,
    /// A conflict was resolved by hand.
    Resolved,
}

impl MergeKind {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

/// Three-way comparison of decoded texts against their common ancestor.
///
/// A conflict exists only when both sides moved away from the ancestor. When
/// just the target moved, the target already contains everything and the
/// merge is a no-op rather than a copy that would discard the target's edit.
pub fn assess_three_way(source: &str, target: &str, ancestor: &str) -> MergeKind {
    let source_changed = source != ancestor;
    let target_changed = target != ancestor;
    match (source_changed, target_changed) {
        (true, true) => MergeKind::Conflict,
        (true, false) => MergeKind::FastForward,
        (false, _) => MergeKind::UpToDate,
    }
}

/// Two-way fallback used when CRDT state is missing on any of the three
/// versions: any difference counts as a conflict, even a pure fast-forward.
pub fn assess_content_only(source: &str, target: &str) -> MergeKind {
    if source == target {
        MergeKind::UpToDate
    } else {
        MergeKind::Conflict
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Structured payload stored with every merge event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_version_id: Option<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version_id: Option<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestor_version_id: Option<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<MergeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_version_id: Option<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Branch models and DTOs.
//!
//! Defines the row struct for `branches`, the insert/update inputs the
//! store consumes, and the request and summary types used by the API layer.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use draftline_core::branching::{is_main_branch, ForkPoint};
use draftline_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A branch row from the `branches` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Branch {
    pub id: DbId,
    pub document_id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_branch_id: Option<DbId>,
    pub base_version_id: Option<DbId>,
    /// Fork chain from the immediate parent up to the root.
    #[sqlx(json)]
    pub lineage: Vec<ForkPoint>,
    pub head_version_id: Option<DbId>,
    pub head_seq: i64,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Branch {
    pub fn is_main(&self) -> bool {
        is_main_branch(&self.name)
    }

    /// This branch's current head as a fork point.
    pub fn head_point(&self) -> ForkPoint {
        ForkPoint::new(self.id, self.head_version_id, self.head_seq)
    }
}

// ---------------------------------------------------------------------------
// Store inputs
// ---------------------------------------------------------------------------

/// Fully resolved insert input for a forked branch.
#[derive(Debug, Clone)]
pub struct NewBranch {
    pub document_id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_branch_id: DbId,
    pub base_version_id: Option<DbId>,
    pub lineage: Vec<ForkPoint>,
    pub created_by: DbId,
}

/// Column changes for an existing branch. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct BranchUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for creating a branch. Without a parent the branch forks
/// from `main`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBranch {
    pub name: String,
    pub description: Option<String>,
    pub parent_branch_id: Option<DbId>,
}

/// Request body for updating a branch (all fields optional).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBranch {
    pub name: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// The head version of a branch, without its content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionSummary {
    pub id: DbId,
    pub seq: i64,
    pub word_count: i32,
    pub author_id: DbId,
    pub created_at: Timestamp,
}

/// A branch enriched with its head and history size.
#[derive(Debug, Clone, Serialize)]
pub struct BranchSummary {
    #[serde(flatten)]
    pub branch: Branch,
    pub head: Option<VersionSummary>,
    pub version_count: i64,
}

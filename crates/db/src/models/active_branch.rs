use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use draftline_core::types::{DbId, Timestamp};

/// A row from the `active_branches` table: the branch a user is viewing.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ActiveBranch {
    pub document_id: DbId,
    pub user_id: DbId,
    pub branch_id: DbId,
    pub updated_at: Timestamp,
}

/// Request body for switching the caller's active branch.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchActiveBranch {
    pub branch_id: DbId,
}

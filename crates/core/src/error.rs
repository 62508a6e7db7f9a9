use crate::merge::MergeStatus;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Branch '{name}' is protected and cannot be {action}")]
    ProtectedBranch { name: String, action: &'static str },

    #[error("Merge event {merge_event_id} is {status}, only conflicted merges can be resolved")]
    NotConflicted {
        merge_event_id: DbId,
        status: MergeStatus,
    },

    #[error("Version {version_id} does not belong to branch {branch_id}")]
    VersionNotInBranch { version_id: DbId, branch_id: DbId },

    #[error("Invalid branch pair: {0}")]
    InvalidBranchPair(String),

    #[error("Nothing to merge: branch {branch_id} has no versions")]
    NoVersionsToMerge { branch_id: DbId },

    #[error(
        "No common ancestor for branches {branch_a} and {branch_b}: \
         history exceeds the {window}-version search window"
    )]
    NoCommonAncestor {
        branch_a: DbId,
        branch_b: DbId,
        window: usize,
    },

    #[error("Conflicting write on branch {branch_id}: the branch head moved")]
    ConflictingWrite { branch_id: DbId },

    #[error("CRDT error: {0}")]
    Crdt(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`CoreError`], used by callers that only care
/// about the category of failure (HTTP status mapping, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    /// Operation not legal in the current state: deleting or renaming
    /// `main`, resolving a merge that is not conflicted, rolling back to a
    /// version from another branch.
    InvalidState,
    InvalidBranchPair,
    NoVersionsToMerge,
    NoCommonAncestor,
    ConflictingWrite,
    Internal,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::ProtectedBranch { .. }
            | Self::NotConflicted { .. }
            | Self::VersionNotInBranch { .. } => ErrorKind::InvalidState,
            Self::InvalidBranchPair(_) => ErrorKind::InvalidBranchPair,
            Self::NoVersionsToMerge { .. } => ErrorKind::NoVersionsToMerge,
            Self::NoCommonAncestor { .. } => ErrorKind::NoCommonAncestor,
            Self::ConflictingWrite { .. } => ErrorKind::ConflictingWrite,
            Self::Crdt(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_invalid_state(&self) -> bool {
        self.kind() == ErrorKind::InvalidState
    }
}

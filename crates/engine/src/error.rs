use draftline_core::error::{CoreError, ErrorKind};
use draftline_db::StoreError;

/// Errors returned by engine operations.
///
/// Store failures that carry domain meaning (missing branch, moved head,
/// duplicate slug) are converted to their [`CoreError`] counterparts on the
/// way in, so callers only see [`EngineError::Store`] for infrastructure
/// faults.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BranchNotFound(id) => Self::Core(CoreError::NotFound {
                entity: "Branch",
                id,
            }),
            StoreError::ConflictingWrite { branch_id } => {
                Self::Core(CoreError::ConflictingWrite { branch_id })
            }
            StoreError::DuplicateSlug { slug } => Self::Core(CoreError::Conflict(format!(
                "A branch with slug '{slug}' already exists in this document"
            ))),
            other @ StoreError::Database(_) => Self::Store(other),
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(core) => core.kind(),
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(core) => Some(core),
            Self::Store(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn store_domain_errors_become_core_errors() {
        assert_matches!(
            EngineError::from(StoreError::BranchNotFound(4)),
            EngineError::Core(CoreError::NotFound { entity: "Branch", id: 4 })
        );
        assert_matches!(
            EngineError::from(StoreError::ConflictingWrite { branch_id: 2 }),
            EngineError::Core(CoreError::ConflictingWrite { branch_id: 2 })
        );
        let dup = EngineError::from(StoreError::DuplicateSlug { slug: "alt".into() });
        assert_eq!(dup.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn database_errors_stay_internal() {
        let err = EngineError::from(StoreError::Database(sqlx::Error::RowNotFound));
        assert_matches!(err, EngineError::Store(_));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.as_core().is_none());
    }
}

//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Methods that must join a
//! larger transaction take `&mut Transaction<'_, Postgres>` instead.

pub mod active_branch_repo;
pub mod branch_repo;
pub mod document_repo;
pub mod merge_event_repo;
pub mod version_repo;

pub use active_branch_repo::ActiveBranchRepo;
pub use branch_repo::BranchRepo;
pub use document_repo::DocumentRepo;
pub use merge_event_repo::MergeEventRepo;
pub use version_repo::VersionRepo;

//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - The insert input the store consumes
//! - Request DTOs deserialized by the API layer, where the entity has any

pub mod active_branch;
pub mod branch;
pub mod document;
pub mod merge_event;
pub mod version;

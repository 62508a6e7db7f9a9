//! Request handlers.
//!
//! Each submodule groups the handlers for one resource. Handlers delegate to
//! the shared [`Engine`](draftline_engine::Engine) and map errors via
//! [`AppError`](crate::error::AppError).

pub mod branches;
pub mod documents;
pub mod merges;
pub mod versions;

//! Route definitions for documents and their document-scoped collections.
//!
//! ```text
//! POST /                       create_document
//! GET  /{id}                   get_document
//! GET  /{id}/branches          list_branches
//! POST /{id}/branches          create_branch
//! GET  /{id}/active-branch     get_active_branch
//! PUT  /{id}/active-branch     switch_active_branch
//! GET  /{id}/merges            merge_history
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{branches, documents, merges};
use crate::state::AppState;

/// Document routes, mounted at `/documents`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(documents::create_document))
        .route("/{id}", get(documents::get_document))
        .route(
            "/{id}/branches",
            get(branches::list_branches).post(branches::create_branch),
        )
        .route(
            "/{id}/active-branch",
            get(branches::get_active_branch).put(branches::switch_active_branch),
        )
        .route("/{id}/merges", get(merges::merge_history))
}

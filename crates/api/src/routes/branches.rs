//! Route definitions for branch-level operations.
//!
//! ```text
//! GET    /{id}                         get_branch
//! PUT    /{id}                         update_branch
//! DELETE /{id}                         delete_branch
//! GET    /{id}/versions                list_versions (?limit)
//! POST   /{id}/versions                create_version
//! GET    /{id}/head                    get_branch_head
//! POST   /{id}/rollback                rollback
//! GET    /{id}/diff                    diff_branches
//! GET    /{id}/ancestor/{other_id}     find_common_ancestor
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{branches, versions};
use crate::state::AppState;

/// Branch routes, mounted at `/branches`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(branches::get_branch)
                .put(branches::update_branch)
                .delete(branches::delete_branch),
        )
        .route(
            "/{id}/versions",
            get(versions::list_versions).post(versions::create_version),
        )
        .route("/{id}/head", get(branches::get_branch_head))
        .route("/{id}/rollback", post(versions::rollback))
        .route("/{id}/diff", get(branches::diff_branches))
        .route(
            "/{id}/ancestor/{other_id}",
            get(branches::find_common_ancestor),
        )
}

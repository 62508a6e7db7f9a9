//! Route definitions for merges.
//!
//! ```text
//! POST /                  initiate_merge
//! GET  /{id}              get_merge
//! POST /{id}/resolve      resolve_merge
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::merges;
use crate::state::AppState;

/// Merge routes, mounted at `/merges`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(merges::initiate_merge))
        .route("/{id}", get(merges::get_merge))
        .route("/{id}/resolve", post(merges::resolve_merge))
}

use axum::routing::get;
use axum::Router;

use crate::handlers::versions;
use crate::state::AppState;

/// Version routes, mounted at `/versions`.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(versions::get_version))
}

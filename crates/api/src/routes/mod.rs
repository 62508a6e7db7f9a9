pub mod branches;
pub mod documents;
pub mod health;
pub mod merges;
pub mod versions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /documents                                  create
/// /documents/{id}                             get
/// /documents/{id}/branches                    list, create
/// /documents/{id}/active-branch               get, switch (PUT)
/// /documents/{id}/merges                      merge history
///
/// /branches/{id}                              get, update, delete
/// /branches/{id}/versions                     list (?limit), save (POST)
/// /branches/{id}/head                         current head
/// /branches/{id}/rollback                     restore a version (POST)
/// /branches/{id}/diff                         compare (?compare_to_branch_id | ?compare_to_version_id)
/// /branches/{id}/ancestor/{other_id}          common ancestor
///
/// /versions/{id}                              get
///
/// /merges                                     initiate (POST)
/// /merges/{id}                                get
/// /merges/{id}/resolve                        resolve a conflict (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/documents", documents::router())
        .nest("/branches", branches::router())
        .nest("/versions", versions::router())
        .nest("/merges", merges::router())
}

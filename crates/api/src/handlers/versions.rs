//! Handlers for version history: save, list, fetch, and rollback.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use draftline_core::types::DbId;
use draftline_db::models::version::{
    CreateVersion, HeadExpectation, RollbackRequest, VersionListParams,
};
use draftline_engine::VersionDraft;

use crate::error::AppResult;
use crate::extract::ActorId;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /branches/:id/versions
// ---------------------------------------------------------------------------

/// Newest-first history of a branch (`?limit=`, clamped).
pub async fn list_versions(
    State(state): State<AppState>,
    Path(branch_id): Path<DbId>,
    Query(params): Query<VersionListParams>,
) -> AppResult<impl IntoResponse> {
    let versions = state
        .engine
        .get_branch_versions(branch_id, params.limit)
        .await?;
    Ok(Json(DataResponse { data: versions }))
}

// ---------------------------------------------------------------------------
// POST /branches/:id/versions
// ---------------------------------------------------------------------------

/// Save a version on a branch.
///
/// With `expected_head_version_id` (or `expect_empty_branch`) the save is
/// optimistic and fails with 409 when another writer moved the head.
pub async fn create_version(
    State(state): State<AppState>,
    ActorId(user_id): ActorId,
    Path(branch_id): Path<DbId>,
    Json(body): Json<CreateVersion>,
) -> AppResult<impl IntoResponse> {
    let expected = body.head_expectation();
    let draft = VersionDraft {
        content: body.content,
        crdt_state: body.crdt_state,
        word_count: body.word_count,
    };

    let version = match expected {
        HeadExpectation::Any => state.engine.append(branch_id, draft, user_id).await?,
        HeadExpectation::Exactly(head) => {
            state
                .engine
                .append_if_head(branch_id, draft, user_id, head)
                .await?
        }
    };

    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

// ---------------------------------------------------------------------------
// GET /versions/:id
// ---------------------------------------------------------------------------

/// Any version by id, including versions of deleted branches.
pub async fn get_version(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let version = state.engine.get_version(id).await?;
    Ok(Json(DataResponse { data: version }))
}

// ---------------------------------------------------------------------------
// POST /branches/:id/rollback
// ---------------------------------------------------------------------------

/// Restore an earlier version of the branch as a new head version.
pub async fn rollback(
    State(state): State<AppState>,
    ActorId(user_id): ActorId,
    Path(branch_id): Path<DbId>,
    Json(body): Json<RollbackRequest>,
) -> AppResult<impl IntoResponse> {
    let version = state
        .engine
        .rollback(branch_id, body.version_id, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

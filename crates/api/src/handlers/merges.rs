//! Handlers for merges.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use draftline_core::types::DbId;
use draftline_db::models::merge_event::{CreateMerge, ResolveMerge};
use draftline_db::models::version::Version;
use draftline_engine::Resolution;

use crate::error::AppResult;
use crate::extract::ActorId;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /merges
// ---------------------------------------------------------------------------

/// Merge one branch into another.
///
/// Always answers 201 with the merge outcome: a conflicted merge is a
/// successfully recorded event waiting for resolution.
pub async fn initiate_merge(
    State(state): State<AppState>,
    ActorId(user_id): ActorId,
    Json(body): Json<CreateMerge>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .engine
        .initiate_merge(body.source_branch_id, body.target_branch_id, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

// ---------------------------------------------------------------------------
// GET /merges/:id
// ---------------------------------------------------------------------------

pub async fn get_merge(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let event = state.engine.get_merge_event(id).await?;
    Ok(Json(DataResponse { data: event }))
}

// ---------------------------------------------------------------------------
// POST /merges/:id/resolve
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ResolvedMerge {
    pub merged_version: Version,
}

/// Apply hand-merged content to a conflicted merge.
pub async fn resolve_merge(
    State(state): State<AppState>,
    ActorId(user_id): ActorId,
    Path(id): Path<DbId>,
    Json(body): Json<ResolveMerge>,
) -> AppResult<impl IntoResponse> {
    let resolution = Resolution {
        content: body.content,
        crdt_state: body.crdt_state,
        word_count: body.word_count,
    };
    let merged_version = state.engine.resolve_merge(id, resolution, user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ResolvedMerge { merged_version },
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /documents/:id/merges
// ---------------------------------------------------------------------------

/// A document's merges, newest first.
pub async fn merge_history(
    State(state): State<AppState>,
    Path(document_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let events = state.engine.get_merge_history(document_id).await?;
    Ok(Json(DataResponse { data: events }))
}

//! Handlers for documents.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use draftline_core::types::DbId;
use draftline_db::models::document::CreateDocument;

use crate::error::AppResult;
use crate::extract::ActorId;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /documents
// ---------------------------------------------------------------------------

/// Create a document together with its `main` branch.
pub async fn create_document(
    State(state): State<AppState>,
    ActorId(user_id): ActorId,
    Json(body): Json<CreateDocument>,
) -> AppResult<impl IntoResponse> {
    let created = state.engine.create_document(&body.title, user_id).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

// ---------------------------------------------------------------------------
// GET /documents/:id
// ---------------------------------------------------------------------------

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let document = state.engine.get_document(id).await?;
    Ok(Json(DataResponse { data: document }))
}

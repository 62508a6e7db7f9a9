//! Handlers for branches: the document-scoped branch list, branch CRUD,
//! the caller's active branch, heads, ancestors, and diffs.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use draftline_core::types::DbId;
use draftline_db::models::active_branch::SwitchActiveBranch;
use draftline_db::models::branch::{CreateBranch, UpdateBranch};
use draftline_engine::DiffTarget;

use crate::error::{AppError, AppResult};
use crate::extract::ActorId;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// What `GET /branches/:id/diff` compares against. Exactly one must be set.
#[derive(Debug, Deserialize)]
pub struct DiffParams {
    pub compare_to_branch_id: Option<DbId>,
    pub compare_to_version_id: Option<DbId>,
}

impl DiffParams {
    fn target(&self) -> AppResult<DiffTarget> {
        match (self.compare_to_branch_id, self.compare_to_version_id) {
            (Some(branch_id), None) => Ok(DiffTarget::Branch(branch_id)),
            (None, Some(version_id)) => Ok(DiffTarget::Version(version_id)),
            _ => Err(AppError::BadRequest(
                "Exactly one of compare_to_branch_id or compare_to_version_id is required"
                    .to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// GET /documents/:id/branches
// ---------------------------------------------------------------------------

/// List a document's branches, `main` first, each with its head summary.
pub async fn list_branches(
    State(state): State<AppState>,
    Path(document_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let branches = state.engine.list_branches(document_id).await?;
    Ok(Json(DataResponse { data: branches }))
}

// ---------------------------------------------------------------------------
// POST /documents/:id/branches
// ---------------------------------------------------------------------------

/// Fork a branch. Without `parent_branch_id` it forks from `main`.
pub async fn create_branch(
    State(state): State<AppState>,
    ActorId(user_id): ActorId,
    Path(document_id): Path<DbId>,
    Json(body): Json<CreateBranch>,
) -> AppResult<impl IntoResponse> {
    let branch = state
        .engine
        .create_branch(document_id, &body, user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: branch })))
}

// ---------------------------------------------------------------------------
// Active branch
// ---------------------------------------------------------------------------

/// PUT /documents/:id/active-branch
pub async fn switch_active_branch(
    State(state): State<AppState>,
    ActorId(user_id): ActorId,
    Path(document_id): Path<DbId>,
    Json(body): Json<SwitchActiveBranch>,
) -> AppResult<impl IntoResponse> {
    let active = state
        .engine
        .switch_active_branch(document_id, body.branch_id, user_id)
        .await?;
    Ok(Json(DataResponse { data: active }))
}

/// GET /documents/:id/active-branch
pub async fn get_active_branch(
    State(state): State<AppState>,
    ActorId(user_id): ActorId,
    Path(document_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let branch = state.engine.active_branch(document_id, user_id).await?;
    Ok(Json(DataResponse { data: branch }))
}

// ---------------------------------------------------------------------------
// /branches/:id
// ---------------------------------------------------------------------------

pub async fn get_branch(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let branch = state.engine.get_branch(id).await?;
    Ok(Json(DataResponse { data: branch }))
}

/// Rename a branch or change its description.
pub async fn update_branch(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<UpdateBranch>,
) -> AppResult<impl IntoResponse> {
    let branch = state.engine.update_branch(id, &body).await?;
    Ok(Json(DataResponse { data: branch }))
}

/// Delete a branch. Its versions stay readable through `/versions/:id`.
pub async fn delete_branch(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.engine.delete_branch(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /branches/:id/head
// ---------------------------------------------------------------------------

/// The branch head, or `null` for a branch without versions.
pub async fn get_branch_head(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let head = state.engine.get_branch_head(id).await?;
    Ok(Json(DataResponse { data: head }))
}

// ---------------------------------------------------------------------------
// GET /branches/:id/ancestor/:other_id
// ---------------------------------------------------------------------------

pub async fn find_common_ancestor(
    State(state): State<AppState>,
    Path((id, other_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let ancestor = state.engine.find_common_ancestor(id, other_id).await?;

    tracing::debug!(
        branch_id = id,
        other_branch_id = other_id,
        ancestor_version_id = ?ancestor.as_ref().map(|v| v.id),
        "Common ancestor requested"
    );

    Ok(Json(DataResponse { data: ancestor }))
}

// ---------------------------------------------------------------------------
// GET /branches/:id/diff
// ---------------------------------------------------------------------------

/// Compare the branch head with another branch's head or any version.
pub async fn diff_branches(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<DiffParams>,
) -> AppResult<impl IntoResponse> {
    let target = params.target()?;
    let diff = state.engine.diff_branches(id, target).await?;
    Ok(Json(DataResponse { data: diff }))
}

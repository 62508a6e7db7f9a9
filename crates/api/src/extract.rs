//! Acting-user extractor.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user id in the `x-user-id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use draftline_core::types::DbId;

use crate::error::AppError;

/// Header carrying the acting user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf the request runs.
///
/// ```ignore
/// async fn my_handler(actor: ActorId) -> AppResult<Json<()>> {
///     tracing::info!(user_id = actor.0, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub DbId);

impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::BadRequest(format!("Missing {USER_ID_HEADER} header")))?;

        raw.trim()
            .parse::<DbId>()
            .ok()
            .filter(|id| *id > 0)
            .map(ActorId)
            .ok_or_else(|| {
                AppError::BadRequest(format!("{USER_ID_HEADER} must be a positive integer"))
            })
    }
}

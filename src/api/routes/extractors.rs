//! Shared request extractors.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use super::app_state::AppState;
use super::error::ApiError;

/// A numeric id taken from the request path. Anything that does not
/// parse as an id answers 404, the same as an id with no row behind it.
#[derive(Debug, Clone, Copy)]
pub struct PathId(pub i64);

impl FromRequestParts<AppState> for PathId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::not_found())?;
        raw.parse::<i64>()
            .map(PathId)
            .map_err(|_| ApiError::not_found())
    }
}

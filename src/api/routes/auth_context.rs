//! Authentication context utilities.
//!
//! Extractors that resolve the Authorization header into the calling
//! user. `AuthContext` rejects anonymous requests; `MaybeAuth` carries
//! an optional context for endpoints that adapt to the viewer.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use uuid::Uuid;

use super::app_state::AppState;
use super::error::ApiError;
use crate::models::User;
use crate::services::TokenService;
use crate::storage::UserRepo;

/// Authentication context extracted from request
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user: User,
    pub session_id: Uuid,
}

impl AuthContext {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state).await? {
            Some(context) => Ok(context),
            None => Err(ApiError::unauthorized()),
        }
    }
}

/// Optional authentication for endpoints that also serve anonymous
/// readers. A missing header means anonymous; a present but invalid
/// token is still rejected.
#[derive(Clone, Debug)]
pub struct MaybeAuth(pub Option<AuthContext>);

impl MaybeAuth {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|context| context.user.id)
    }
}

impl FromRequestParts<AppState> for MaybeAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(authenticate(parts, state).await?))
    }
}

/// Resolve the Authorization header into a user, if one was sent.
async fn authenticate(
    parts: &mut Parts,
    state: &AppState,
) -> Result<Option<AuthContext>, ApiError> {
    let Some(auth_header) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return Ok(None);
    };

    // An unknown scheme counts as no credentials, not bad ones
    let Some(token) = TokenService::extract_token(auth_header) else {
        return Ok(None);
    };

    let claims = state.token_service.validate_token(token).map_err(|e| {
        tracing::warn!("Token validation failed: {}", e);
        ApiError::invalid_token()
    })?;

    let session_id =
        Uuid::parse_str(&claims.session_id).map_err(|_| ApiError::invalid_token())?;
    let Some(session) = state.session_store.get_session(session_id).await? else {
        tracing::warn!("Session {} not found or expired", session_id);
        return Err(ApiError::invalid_token());
    };

    let user = UserRepo::new(&state.pool)
        .by_id(session.user_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                ApiError::invalid_token()
            } else {
                ApiError::from(e)
            }
        })?;

    // Touching the session is best-effort; auth already succeeded
    if let Err(e) = state.session_store.update_session_activity(session_id).await {
        tracing::warn!("Failed to update session activity: {}", e);
    }

    Ok(Some(AuthContext { user, session_id }))
}

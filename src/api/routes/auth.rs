//! Authentication routes for token login and logout.
//!
//! Tokens are JWTs bound to a database session row, so logging out
//! revokes the token server-side before its expiry. Clients send the
//! token as `Authorization: Token <jwt>`.

use axum::{Router, extract::State, http::StatusCode, middleware, response::Json, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiError, AppJson, FieldErrors};
use crate::middleware::{create_rate_limiter, rate_limit_middleware};
use crate::models::validation;
use crate::services::verify_password;
use crate::storage::UserRepo;

/// Login attempts allowed per client per minute.
const LOGIN_ATTEMPTS_PER_MINUTE: u32 = 10;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    auth_token: String,
}

/// Create the auth router. Login carries its own per-client rate limit.
pub fn auth_router() -> Router<AppState> {
    let limiter = create_rate_limiter(LOGIN_ATTEMPTS_PER_MINUTE);
    Router::new()
        .route(
            "/auth/token/login/",
            post(login).route_layer(middleware::from_fn_with_state(
                limiter,
                rate_limit_middleware,
            )),
        )
        .route("/auth/token/logout/", post(logout))
}

#[utoipa::path(
    post,
    path = "/auth/token/login/",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Missing fields or bad credentials"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut errors = FieldErrors::new();
    if let Err(message) = validation::required(&body.email) {
        errors.add("email", message);
    }
    if let Err(message) = validation::required(&body.password) {
        errors.add("password", message);
    }
    errors.into_result()?;

    let email = body.email.as_deref().unwrap_or_default().trim().to_lowercase();
    let password = body.password.as_deref().unwrap_or_default();

    let user = UserRepo::new(&state.pool).by_email(&email).await?;
    let verified = user
        .as_ref()
        .is_some_and(|u| verify_password(password, &u.password_hash));
    let Some(user) = user.filter(|_| verified) else {
        warn!("Failed login attempt for {}", email);
        return Err(ApiError::non_field(
            "Unable to log in with provided credentials.",
        ));
    };

    let session_id = Uuid::new_v4();
    state.session_store.create_session(session_id, user.id).await?;
    let auth_token = state
        .token_service
        .generate_token(user.id, &user.username, session_id)
        .map_err(ApiError::internal)?;

    info!("User {} logged in", user.id);
    Ok(Json(TokenResponse { auth_token }))
}

#[utoipa::path(
    post,
    path = "/auth/token/logout/",
    tag = "Auth",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Not authenticated")
    ),
    security(("token_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    state.session_store.revoke_session(auth.session_id).await?;
    info!("User {} logged out", auth.user_id());
    Ok(StatusCode::NO_CONTENT)
}

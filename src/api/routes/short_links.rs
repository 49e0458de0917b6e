//! Public short-link redirects, mounted at `/s/` outside the API prefix.

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use super::app_state::AppState;
use super::error::ApiError;
use crate::storage::ShortLinkRepo;

/// Create the short-link router
pub fn short_link_router() -> Router<AppState> {
    Router::new().route("/s/{token}/", get(resolve_short_link))
}

#[utoipa::path(
    get,
    path = "/s/{token}/",
    tag = "Short links",
    params(("token" = String, Path, description = "Short-link token")),
    responses(
        (status = 302, description = "Redirect to the recipe page"),
        (status = 404, description = "Unknown token")
    )
)]
pub async fn resolve_short_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe_id = ShortLinkRepo::new(&state.pool).resolve(&token).await?;

    let mut location = state.config.base_url.clone();
    location.set_path(&format!("/recipes/{}/", recipe_id));
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    ))
}

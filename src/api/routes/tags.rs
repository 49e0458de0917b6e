//! Tag routes. Tags are reference data maintained out of band, so the
//! API only reads them. Listings are not paginated.

use axum::{Router, extract::State, response::Json, routing::get};

use super::app_state::AppState;
use super::error::ApiError;
use super::extractors::PathId;
use crate::models::Tag;
use crate::storage::TagRepo;

/// Create the tags router
pub fn tags_router() -> Router<AppState> {
    Router::new()
        .route("/tags/", get(list_tags))
        .route("/tags/{id}/", get(get_tag))
}

#[utoipa::path(
    get,
    path = "/tags/",
    tag = "Tags",
    responses(
        (status = 200, description = "All tags, sorted by name", body = Vec<Tag>)
    )
)]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = TagRepo::new(&state.pool).list().await?;
    Ok(Json(tags))
}

#[utoipa::path(
    get,
    path = "/tags/{id}/",
    tag = "Tags",
    params(("id" = i64, Path, description = "Tag id")),
    responses(
        (status = 200, description = "One tag", body = Tag),
        (status = 404, description = "No such tag")
    )
)]
pub async fn get_tag(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<Tag>, ApiError> {
    let tag = TagRepo::new(&state.pool).by_id(id).await?;
    Ok(Json(tag))
}

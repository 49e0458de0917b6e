//! Ingredient routes. Read-only reference data with a name prefix
//! filter used by the recipe form's autocomplete.

use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::Deserialize;

use super::app_state::AppState;
use super::error::ApiError;
use super::extractors::PathId;
use crate::models::Ingredient;
use crate::storage::IngredientRepo;

#[derive(Debug, Default, Deserialize)]
pub struct IngredientListQuery {
    /// Case-insensitive name prefix
    name: Option<String>,
}

/// Create the ingredients router
pub fn ingredients_router() -> Router<AppState> {
    Router::new()
        .route("/ingredients/", get(list_ingredients))
        .route("/ingredients/{id}/", get(get_ingredient))
}

#[utoipa::path(
    get,
    path = "/ingredients/",
    tag = "Ingredients",
    params(("name" = Option<String>, Query, description = "Name prefix filter")),
    responses(
        (status = 200, description = "Matching ingredients", body = Vec<Ingredient>)
    )
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientListQuery>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let ingredients = IngredientRepo::new(&state.pool)
        .list(query.name.as_deref())
        .await?;
    Ok(Json(ingredients))
}

#[utoipa::path(
    get,
    path = "/ingredients/{id}/",
    tag = "Ingredients",
    params(("id" = i64, Path, description = "Ingredient id")),
    responses(
        (status = 200, description = "One ingredient", body = Ingredient),
        (status = 404, description = "No such ingredient")
    )
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<Ingredient>, ApiError> {
    let ingredient = IngredientRepo::new(&state.pool).by_id(id).await?;
    Ok(Json(ingredient))
}

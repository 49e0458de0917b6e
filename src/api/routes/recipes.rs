//! Recipe routes.
//!
//! Listings and details are open to anonymous readers; writes require a
//! token and are restricted to the recipe's author. Favorites, the
//! shopping cart and its text export, and short links live here too
//! because they are recipe-scoped.

use std::collections::HashSet;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::Json,
    routing::{get, post},
};
use axum_extra::extract::Query as MultiQuery;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::app_state::AppState;
use super::auth_context::{AuthContext, MaybeAuth};
use super::error::{ApiError, AppJson, FieldErrors};
use super::extractors::PathId;
use crate::config::AppConfig;
use crate::models::validation::{self, INVALID_IMAGE_MESSAGE};
use crate::models::{
    Page, PageQuery, Pagination, RecipeIngredientResponse, RecipePage, RecipeResponse,
    RecipeShortResponse, UserResponse,
};
use crate::services::{ImageError, render_shopping_list, SHOPPING_LIST_FILENAME};
use crate::storage::{
    FavoriteRepo, IngredientAmount, IngredientRepo, NewRecipe, RecipeDetails, RecipeFilters,
    RecipeRepo, RecipeWrite, ShoppingCartRepo, ShortLinkRepo, TagRepo,
};

/// Upper bound for integer fields stored as INT columns.
const MAX_INT_FIELD: i64 = i32::MAX as i64;

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngredientLineRequest {
    pub id: Option<i64>,
    /// Amount of the ingredient; numeric strings are accepted
    #[schema(value_type = Option<i32>)]
    pub amount: Option<Value>,
}

/// Body for creating or updating a recipe. Every field is optional at
/// the parse level so missing ones come back as field errors.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeUpsertRequest {
    pub ingredients: Option<Vec<IngredientLineRequest>>,
    pub tags: Option<Vec<i64>>,
    /// Base64 data URI, e.g. `data:image/png;base64,...`
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    #[schema(value_type = Option<i32>)]
    pub cooking_time: Option<Value>,
}

#[derive(Serialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    short_link: String,
}

/// List filters. `tags` may repeat and matches any of the given slugs.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    page: Option<String>,
    limit: Option<String>,
    author: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    is_favorited: Option<String>,
    is_in_shopping_cart: Option<String>,
}

/// Create the recipes router
pub fn recipes_router() -> Router<AppState> {
    Router::new()
        .route("/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/download_shopping_cart/",
            get(download_shopping_cart),
        )
        .route(
            "/recipes/{id}/",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route(
            "/recipes/{id}/favorite/",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(add_to_cart).delete(remove_from_cart),
        )
        .route("/recipes/{id}/get-link/", get(get_link))
}

#[utoipa::path(
    get,
    path = "/recipes/",
    tag = "Recipes",
    params(
        ("author" = Option<i64>, Query, description = "Filter by author id"),
        ("tags" = Option<Vec<String>>, Query, description = "Filter by tag slugs, any match"),
        ("is_favorited" = Option<String>, Query, description = "1 limits to the viewer's favorites"),
        ("is_in_shopping_cart" = Option<String>, Query, description = "1 limits to the viewer's cart")
    ),
    responses(
        (status = 200, description = "Paginated recipes, newest first", body = RecipePage),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: MaybeAuth,
    MultiQuery(query): MultiQuery<RecipeListQuery>,
) -> Result<Json<Page<RecipeResponse>>, ApiError> {
    let page_query = PageQuery {
        page: query.page.clone(),
        limit: query.limit.clone(),
    };
    let pagination = Pagination::from_query(&page_query, state.config.page_size)
        .ok_or_else(ApiError::invalid_page)?;

    // The flag filters only mean something for a logged-in viewer
    let viewer_id = viewer.user_id();
    let filters = RecipeFilters {
        author: query
            .author
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok()),
        tag_slugs: (!query.tags.is_empty()).then(|| query.tags.clone()),
        favorited_by: viewer_id.filter(|_| flag_on(query.is_favorited.as_deref())),
        in_cart_of: viewer_id.filter(|_| flag_on(query.is_in_shopping_cart.as_deref())),
    };

    let (details, total) = RecipeRepo::new(&state.pool)
        .list(&filters, viewer_id, &pagination)
        .await?;
    if !pagination.is_valid_page(total) {
        return Err(ApiError::invalid_page());
    }

    let results = details
        .into_iter()
        .map(|d| to_recipe_response(d, &state.config))
        .collect();

    let mut extra: Vec<(&str, String)> = Vec::new();
    if let Some(raw) = query.limit.clone() {
        extra.push(("limit", raw));
    }
    if let Some(raw) = query.author.clone() {
        extra.push(("author", raw));
    }
    for slug in &query.tags {
        extra.push(("tags", slug.clone()));
    }
    if let Some(raw) = query.is_favorited.clone() {
        extra.push(("is_favorited", raw));
    }
    if let Some(raw) = query.is_in_shopping_cart.clone() {
        extra.push(("is_in_shopping_cart", raw));
    }
    Ok(Json(Page::new(
        results,
        total,
        &pagination,
        &state.config.base_url,
        "/api/recipes/",
        &extra,
    )))
}

#[utoipa::path(
    post,
    path = "/recipes/",
    tag = "Recipes",
    request_body = RecipeUpsertRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation failed, per-field messages"),
        (status = 401, description = "Not authenticated")
    ),
    security(("token_auth" = []))
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(body): AppJson<RecipeUpsertRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    let validated = validate_recipe(&state, &body, true).await?;
    let image_data = validated.image_data.as_deref().unwrap_or_default();
    let image = store_image(&state, image_data)?;

    let repo = RecipeRepo::new(&state.pool);
    let recipe_id = match repo
        .create(NewRecipe {
            author_id: auth.user_id(),
            name: &validated.name,
            text: &validated.text,
            image: &image,
            cooking_time: validated.cooking_time,
            tag_ids: &validated.tag_ids,
            ingredients: &validated.ingredients,
        })
        .await
    {
        Ok(id) => id,
        Err(e) => {
            state.images.remove(&image);
            return Err(e.into());
        }
    };

    info!("User {} created recipe {}", auth.user_id(), recipe_id);
    let details = repo.details(recipe_id, Some(auth.user_id())).await?;
    Ok((
        StatusCode::CREATED,
        Json(to_recipe_response(details, &state.config)),
    ))
}

#[utoipa::path(
    get,
    path = "/recipes/{id}/",
    tag = "Recipes",
    params(("id" = i64, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Full recipe", body = RecipeResponse),
        (status = 404, description = "No such recipe")
    )
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: MaybeAuth,
    PathId(id): PathId,
) -> Result<Json<RecipeResponse>, ApiError> {
    let details = RecipeRepo::new(&state.pool)
        .details(id, viewer.user_id())
        .await?;
    Ok(Json(to_recipe_response(details, &state.config)))
}

#[utoipa::path(
    patch,
    path = "/recipes/{id}/",
    tag = "Recipes",
    params(("id" = i64, Path, description = "Recipe id")),
    request_body = RecipeUpsertRequest,
    responses(
        (status = 200, description = "Updated recipe", body = RecipeResponse),
        (status = 400, description = "Validation failed, per-field messages"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such recipe")
    ),
    security(("token_auth" = []))
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    auth: AuthContext,
    PathId(id): PathId,
    AppJson(body): AppJson<RecipeUpsertRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let repo = RecipeRepo::new(&state.pool);
    let recipe = repo.get(id).await?;
    if recipe.author_id != auth.user_id() {
        return Err(ApiError::permission_denied());
    }

    let validated = validate_recipe(&state, &body, false).await?;
    let new_image = match validated.image_data.as_deref() {
        Some(data) => Some(store_image(&state, data)?),
        None => None,
    };

    let result = repo
        .update(
            id,
            RecipeWrite {
                name: Some(&validated.name),
                text: Some(&validated.text),
                image: new_image.as_deref(),
                cooking_time: Some(validated.cooking_time),
                tag_ids: &validated.tag_ids,
                ingredients: &validated.ingredients,
            },
        )
        .await;
    if let Err(e) = result {
        if let Some(image) = new_image {
            state.images.remove(&image);
        }
        return Err(e.into());
    }
    if new_image.is_some() {
        state.images.remove(&recipe.image);
    }

    info!("User {} updated recipe {}", auth.user_id(), id);
    let details = repo.details(id, Some(auth.user_id())).await?;
    Ok(Json(to_recipe_response(details, &state.config)))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}/",
    tag = "Recipes",
    params(("id" = i64, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such recipe")
    ),
    security(("token_auth" = []))
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    auth: AuthContext,
    PathId(id): PathId,
) -> Result<StatusCode, ApiError> {
    let repo = RecipeRepo::new(&state.pool);
    let recipe = repo.get(id).await?;
    if recipe.author_id != auth.user_id() {
        return Err(ApiError::permission_denied());
    }

    if repo.delete(id).await? {
        state.images.remove(&recipe.image);
    }
    info!("User {} deleted recipe {}", auth.user_id(), id);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/recipes/{id}/favorite/",
    tag = "Favorites",
    params(("id" = i64, Path, description = "Recipe id")),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeShortResponse),
        (status = 400, description = "Already in favorites"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such recipe")
    ),
    security(("token_auth" = []))
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    auth: AuthContext,
    PathId(id): PathId,
) -> Result<(StatusCode, Json<RecipeShortResponse>), ApiError> {
    let recipe = RecipeRepo::new(&state.pool).get(id).await?;
    match FavoriteRepo::new(&state.pool).add(auth.user_id(), id).await {
        Ok(()) => {}
        Err(e) if e.is_already_exists() => {
            return Err(ApiError::non_field("Recipe is already in favorites."));
        }
        Err(e) => return Err(e.into()),
    }
    Ok((
        StatusCode::CREATED,
        Json(RecipeShortResponse::from_recipe(&recipe, &state.config)),
    ))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}/favorite/",
    tag = "Favorites",
    params(("id" = i64, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Was not in favorites"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such recipe")
    ),
    security(("token_auth" = []))
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: AuthContext,
    PathId(id): PathId,
) -> Result<StatusCode, ApiError> {
    RecipeRepo::new(&state.pool).get(id).await?;
    let removed = FavoriteRepo::new(&state.pool)
        .remove(auth.user_id(), id)
        .await?;
    if !removed {
        return Err(ApiError::non_field("Recipe is not in favorites."));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/recipes/{id}/shopping_cart/",
    tag = "Shopping cart",
    params(("id" = i64, Path, description = "Recipe id")),
    responses(
        (status = 201, description = "Added to cart", body = RecipeShortResponse),
        (status = 400, description = "Already in cart"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such recipe")
    ),
    security(("token_auth" = []))
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    auth: AuthContext,
    PathId(id): PathId,
) -> Result<(StatusCode, Json<RecipeShortResponse>), ApiError> {
    let recipe = RecipeRepo::new(&state.pool).get(id).await?;
    match ShoppingCartRepo::new(&state.pool)
        .add(auth.user_id(), id)
        .await
    {
        Ok(()) => {}
        Err(e) if e.is_already_exists() => {
            return Err(ApiError::non_field("Recipe is already in shopping cart."));
        }
        Err(e) => return Err(e.into()),
    }
    Ok((
        StatusCode::CREATED,
        Json(RecipeShortResponse::from_recipe(&recipe, &state.config)),
    ))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}/shopping_cart/",
    tag = "Shopping cart",
    params(("id" = i64, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Removed from cart"),
        (status = 400, description = "Was not in cart"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such recipe")
    ),
    security(("token_auth" = []))
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    auth: AuthContext,
    PathId(id): PathId,
) -> Result<StatusCode, ApiError> {
    RecipeRepo::new(&state.pool).get(id).await?;
    let removed = ShoppingCartRepo::new(&state.pool)
        .remove(auth.user_id(), id)
        .await?;
    if !removed {
        return Err(ApiError::non_field("Recipe is not in shopping cart."));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/recipes/download_shopping_cart/",
    tag = "Shopping cart",
    responses(
        (status = 200, description = "Aggregated shopping list as text"),
        (status = 401, description = "Not authenticated")
    ),
    security(("token_auth" = []))
)]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let items = ShoppingCartRepo::new(&state.pool)
        .aggregate(auth.user_id())
        .await?;
    let body = render_shopping_list(&items);

    let headers = [
        (
            header::CONTENT_TYPE,
            "text/plain; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", SHOPPING_LIST_FILENAME),
        ),
    ];
    Ok((headers, body))
}

#[utoipa::path(
    get,
    path = "/recipes/{id}/get-link/",
    tag = "Recipes",
    params(("id" = i64, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Short link for the recipe", body = ShortLinkResponse),
        (status = 404, description = "No such recipe")
    )
)]
pub async fn get_link(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<ShortLinkResponse>, ApiError> {
    RecipeRepo::new(&state.pool).get(id).await?;
    let token = ShortLinkRepo::new(&state.pool).get_or_create(id).await?;
    Ok(Json(ShortLinkResponse {
        short_link: state.config.short_link_url(&token),
    }))
}

/// Recipe body after validation, ready for storage.
struct ValidatedRecipe {
    name: String,
    text: String,
    cooking_time: i32,
    tag_ids: Vec<i64>,
    ingredients: Vec<IngredientAmount>,
    image_data: Option<String>,
}

/// Validate a create/update body. Tags and ingredients stay required on
/// partial updates; only the image may be omitted there to keep the
/// stored one.
async fn validate_recipe(
    state: &AppState,
    body: &RecipeUpsertRequest,
    image_required: bool,
) -> Result<ValidatedRecipe, ApiError> {
    let mut errors = FieldErrors::new();

    let name = match validation::required(&body.name) {
        Ok(raw) => {
            if let Err(message) = validation::max_length(raw, 256) {
                errors.add("name", message);
            }
            raw.trim().to_string()
        }
        Err(message) => {
            errors.add("name", message);
            String::new()
        }
    };

    let text = match validation::required(&body.text) {
        Ok(raw) => raw.to_string(),
        Err(message) => {
            errors.add("text", message);
            String::new()
        }
    };

    let cooking_time = validate_bounded_int(&body.cooking_time, "cooking_time", &mut errors);

    let image_data = match body.image.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(raw.to_string()),
        Some(_) => {
            errors.add("image", "This field may not be blank.");
            None
        }
        None if image_required => {
            errors.add("image", "This field is required.");
            None
        }
        None => None,
    };

    let tag_ids = match &body.tags {
        None => {
            errors.add("tags", "This field is required.");
            Vec::new()
        }
        Some(ids) if ids.is_empty() => {
            errors.add("tags", "This list may not be empty.");
            Vec::new()
        }
        Some(ids) => {
            let mut seen = HashSet::new();
            if ids.iter().any(|id| !seen.insert(*id)) {
                errors.add("tags", "Duplicate tags are not allowed.");
            }
            let found: HashSet<i64> = TagRepo::new(&state.pool)
                .by_ids(ids)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();
            for id in ids {
                if !found.contains(id) {
                    errors.add("tags", format!("Invalid pk \"{}\" - object does not exist.", id));
                }
            }
            ids.clone()
        }
    };

    let ingredients = match &body.ingredients {
        None => {
            errors.add("ingredients", "This field is required.");
            Vec::new()
        }
        Some(items) if items.is_empty() => {
            errors.add("ingredients", "This list may not be empty.");
            Vec::new()
        }
        Some(items) => {
            let mut lines = Vec::with_capacity(items.len());
            for item in items {
                let Some(id) = item.id else {
                    errors.add("ingredients", "This field is required.");
                    continue;
                };
                let amount = validate_bounded_int(&item.amount, "ingredients", &mut errors);
                lines.push(IngredientAmount {
                    ingredient_id: id,
                    amount,
                });
            }

            let ids: Vec<i64> = lines.iter().map(|line| line.ingredient_id).collect();
            let mut seen = HashSet::new();
            if ids.iter().any(|id| !seen.insert(*id)) {
                errors.add("ingredients", "Duplicate ingredients are not allowed.");
            }
            let found: HashSet<i64> = IngredientRepo::new(&state.pool)
                .by_ids(&ids)
                .await?
                .into_iter()
                .map(|i| i.id)
                .collect();
            for id in &ids {
                if !found.contains(id) {
                    errors.add(
                        "ingredients",
                        format!("Invalid pk \"{}\" - object does not exist.", id),
                    );
                }
            }
            lines
        }
    };

    errors.into_result()?;
    Ok(ValidatedRecipe {
        name,
        text,
        cooking_time,
        tag_ids,
        ingredients,
        image_data,
    })
}

/// Parse a required positive INT-sized field, accepting numeric strings.
/// Returns 0 when invalid; the recorded field error aborts the request
/// before the value is ever used.
fn validate_bounded_int(value: &Option<Value>, field: &str, errors: &mut FieldErrors) -> i32 {
    let parsed = match value {
        None | Some(Value::Null) => {
            errors.add(field, "This field is required.");
            return 0;
        }
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    match parsed {
        None => {
            errors.add(field, "A valid integer is required.");
            0
        }
        Some(v) if v < 1 => {
            errors.add(field, "Ensure this value is greater than or equal to 1.");
            0
        }
        Some(v) if v > MAX_INT_FIELD => {
            errors.add(
                field,
                "Ensure this value is less than or equal to 2147483647.",
            );
            0
        }
        Some(v) => v as i32,
    }
}

/// Decode and persist an uploaded recipe image.
fn store_image(state: &AppState, data: &str) -> Result<String, ApiError> {
    match state.images.save_data_uri(data, "recipes") {
        Ok(path) => Ok(path),
        Err(ImageError::Io(e)) => Err(ApiError::internal(format!("failed to store image: {}", e))),
        Err(e) => {
            warn!("Recipe image rejected: {}", e);
            Err(ApiError::field("image", INVALID_IMAGE_MESSAGE))
        }
    }
}

fn to_recipe_response(details: RecipeDetails, config: &AppConfig) -> RecipeResponse {
    RecipeResponse {
        id: details.recipe.id,
        tags: details.tags,
        author: UserResponse::from_user(&details.author, details.author_subscribed, config),
        ingredients: details
            .ingredients
            .into_iter()
            .map(|line| RecipeIngredientResponse {
                id: line.id,
                name: line.name,
                measurement_unit: line.measurement_unit,
                amount: line.amount,
            })
            .collect(),
        is_favorited: details.is_favorited,
        is_in_shopping_cart: details.is_in_shopping_cart,
        name: details.recipe.name,
        image: config.media_url(&details.recipe.image),
        text: details.recipe.text,
        cooking_time: details.recipe.cooking_time,
    }
}

/// Query flags accept `1` and `true`.
fn flag_on(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), Some("1") | Some("true") | Some("True"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_parsing() {
        assert!(flag_on(Some("1")));
        assert!(flag_on(Some("true")));
        assert!(flag_on(Some("True")));
        assert!(!flag_on(Some("0")));
        assert!(!flag_on(Some("yes")));
        assert!(!flag_on(None));
    }

    #[test]
    fn bounded_int_accepts_numbers_and_numeric_strings() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            validate_bounded_int(&Some(Value::from(30)), "cooking_time", &mut errors),
            30
        );
        assert_eq!(
            validate_bounded_int(&Some(Value::from("15")), "cooking_time", &mut errors),
            15
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn bounded_int_rejects_out_of_range() {
        let mut errors = FieldErrors::new();
        validate_bounded_int(&Some(Value::from(0)), "cooking_time", &mut errors);
        assert!(!errors.is_empty());

        let mut errors = FieldErrors::new();
        validate_bounded_int(&Some(Value::from(2_147_483_648_i64)), "amount", &mut errors);
        assert!(!errors.is_empty());

        let mut errors = FieldErrors::new();
        validate_bounded_int(&None, "amount", &mut errors);
        assert!(!errors.is_empty());
    }
}

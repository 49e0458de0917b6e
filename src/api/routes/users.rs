//! User account routes.
//!
//! Registration and profile listings are open; everything under `me`,
//! password changes and subscriptions require a token.

use std::collections::HashMap;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::app_state::AppState;
use super::auth_context::{AuthContext, MaybeAuth};
use super::error::{ApiError, AppJson, FieldErrors};
use super::extractors::PathId;
use crate::models::validation::{self, INVALID_IMAGE_MESSAGE};
use crate::models::{
    Page, PageQuery, Pagination, RecipeShortResponse, RegisterRequest, RegisterResponse,
    SubscriptionPage, SubscriptionResponse, User, UserPage, UserResponse,
};
use crate::services::{ImageError, hash_password, verify_password};
use crate::storage::{RecipeRepo, SubscriptionRepo, UserRepo};

#[derive(Deserialize, ToSchema)]
pub struct SetPasswordRequest {
    new_password: Option<String>,
    current_password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AvatarRequest {
    avatar: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AvatarResponse {
    avatar: String,
}

/// Query parameters for subscription endpoints. `recipes_limit` caps the
/// embedded recipe list per author; a malformed value is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    page: Option<String>,
    limit: Option<String>,
    recipes_limit: Option<String>,
}

/// Create the users router
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/users/", post(register).get(list_users))
        .route("/users/me/", get(me))
        .route("/users/me/avatar/", put(put_avatar).delete(delete_avatar))
        .route("/users/set_password/", post(set_password))
        .route("/users/subscriptions/", get(list_subscriptions))
        .route("/users/{id}/", get(get_user))
        .route("/users/{id}/subscribe/", post(subscribe).delete(unsubscribe))
}

#[utoipa::path(
    post,
    path = "/users/",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation failed, per-field messages")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let repo = UserRepo::new(&state.pool);
    let mut errors = FieldErrors::new();

    let email = match validation::required(&body.email) {
        Ok(raw) => {
            let email = raw.trim().to_lowercase();
            if let Err(message) = validation::validate_email(&email) {
                errors.add("email", message);
            } else if repo.email_taken(&email).await? {
                errors.add("email", "user with this email already exists.");
            }
            Some(email)
        }
        Err(message) => {
            errors.add("email", message);
            None
        }
    };

    let username = match validation::required(&body.username) {
        Ok(raw) => {
            let username = raw.trim().to_string();
            if let Err(message) = validation::validate_username(&username) {
                errors.add("username", message);
            } else if repo.username_taken(&username).await? {
                errors.add("username", "A user with that username already exists.");
            }
            Some(username)
        }
        Err(message) => {
            errors.add("username", message);
            None
        }
    };

    for (field, value) in [
        ("first_name", &body.first_name),
        ("last_name", &body.last_name),
    ] {
        match validation::required(value) {
            Ok(raw) => {
                if let Err(message) = validation::max_length(raw, 150) {
                    errors.add(field, message);
                }
            }
            Err(message) => errors.add(field, message),
        }
    }

    match validation::required(&body.password) {
        Ok(raw) => {
            if let Err(message) = validation::validate_password(raw) {
                errors.add("password", message);
            }
        }
        Err(message) => errors.add("password", message),
    }

    errors.into_result()?;

    let password_hash = hash_password(body.password.as_deref().unwrap_or_default());
    let user = repo
        .create(crate::storage::NewUser {
            email: email.as_deref().unwrap_or_default(),
            username: username.as_deref().unwrap_or_default(),
            first_name: body.first_name.as_deref().unwrap_or_default().trim(),
            last_name: body.last_name.as_deref().unwrap_or_default().trim(),
            password_hash: &password_hash,
        })
        .await?;

    info!("Registered user {} ({})", user.id, user.username);
    Ok((StatusCode::CREATED, Json(RegisterResponse::from_user(&user))))
}

#[utoipa::path(
    get,
    path = "/users/",
    tag = "Users",
    responses(
        (status = 200, description = "Paginated user list", body = UserPage),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    viewer: MaybeAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserResponse>>, ApiError> {
    let pagination = Pagination::from_query(&query, state.config.page_size)
        .ok_or_else(ApiError::invalid_page)?;
    let (users, total) = UserRepo::new(&state.pool).list(&pagination).await?;
    if !pagination.is_valid_page(total) {
        return Err(ApiError::invalid_page());
    }

    let subscribed = match viewer.user_id() {
        Some(viewer_id) => {
            let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
            SubscriptionRepo::new(&state.pool)
                .subscribed_author_ids(viewer_id, &ids)
                .await?
        }
        None => Default::default(),
    };

    let results = users
        .iter()
        .map(|user| UserResponse::from_user(user, subscribed.contains(&user.id), &state.config))
        .collect();

    let mut extra: Vec<(&str, String)> = Vec::new();
    if let Some(raw) = query.limit.clone() {
        extra.push(("limit", raw));
    }
    Ok(Json(Page::new(
        results,
        total,
        &pagination,
        &state.config.base_url,
        "/api/users/",
        &extra,
    )))
}

#[utoipa::path(
    get,
    path = "/users/{id}/",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    viewer: MaybeAuth,
    PathId(id): PathId,
) -> Result<Json<UserResponse>, ApiError> {
    let user = UserRepo::new(&state.pool).by_id(id).await?;
    let is_subscribed = match viewer.user_id() {
        Some(viewer_id) => {
            SubscriptionRepo::new(&state.pool)
                .exists(viewer_id, id)
                .await?
        }
        None => false,
    };
    Ok(Json(UserResponse::from_user(
        &user,
        is_subscribed,
        &state.config,
    )))
}

#[utoipa::path(
    get,
    path = "/users/me/",
    tag = "Users",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("token_auth" = []))
)]
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> Json<UserResponse> {
    Json(UserResponse::from_user(&auth.user, false, &state.config))
}

#[utoipa::path(
    put,
    path = "/users/me/avatar/",
    tag = "Users",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar replaced", body = AvatarResponse),
        (status = 400, description = "Missing or undecodable image"),
        (status = 401, description = "Not authenticated")
    ),
    security(("token_auth" = []))
)]
pub async fn put_avatar(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(body): AppJson<AvatarRequest>,
) -> Result<Json<AvatarResponse>, ApiError> {
    let data =
        validation::required(&body.avatar).map_err(|message| ApiError::field("avatar", message))?;

    let relative = match state.images.save_data_uri(data, "avatars") {
        Ok(path) => path,
        Err(ImageError::Io(e)) => {
            return Err(ApiError::internal(format!("failed to store avatar: {}", e)));
        }
        Err(e) => {
            warn!("Avatar upload rejected: {}", e);
            return Err(ApiError::field("avatar", INVALID_IMAGE_MESSAGE));
        }
    };

    let previous = UserRepo::new(&state.pool)
        .set_avatar(auth.user_id(), Some(&relative))
        .await?;
    if let Some(old) = previous {
        state.images.remove(&old);
    }

    Ok(Json(AvatarResponse {
        avatar: state.config.media_url(&relative),
    }))
}

#[utoipa::path(
    delete,
    path = "/users/me/avatar/",
    tag = "Users",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Not authenticated")
    ),
    security(("token_auth" = []))
)]
pub async fn delete_avatar(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    let previous = UserRepo::new(&state.pool)
        .set_avatar(auth.user_id(), None)
        .await?;
    if let Some(old) = previous {
        state.images.remove(&old);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/users/set_password/",
    tag = "Users",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or weak new one"),
        (status = 401, description = "Not authenticated")
    ),
    security(("token_auth" = []))
)]
pub async fn set_password(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(body): AppJson<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let mut errors = FieldErrors::new();

    match validation::required(&body.current_password) {
        Ok(current) => {
            if !verify_password(current, &auth.user.password_hash) {
                errors.add("current_password", "Invalid password.");
            }
        }
        Err(message) => errors.add("current_password", message),
    }

    match validation::required(&body.new_password) {
        Ok(new_password) => {
            if let Err(message) = validation::validate_password(new_password) {
                errors.add("new_password", message);
            }
        }
        Err(message) => errors.add("new_password", message),
    }

    errors.into_result()?;

    let password_hash = hash_password(body.new_password.as_deref().unwrap_or_default());
    UserRepo::new(&state.pool)
        .set_password_hash(auth.user_id(), &password_hash)
        .await?;

    info!("User {} changed password", auth.user_id());
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/users/{id}/subscribe/",
    tag = "Subscriptions",
    params(
        ("id" = i64, Path, description = "Author id"),
        ("recipes_limit" = Option<i64>, Query, description = "Cap for embedded recipes")
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Already subscribed or subscribing to yourself"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such user")
    ),
    security(("token_auth" = []))
)]
pub async fn subscribe(
    State(state): State<AppState>,
    auth: AuthContext,
    PathId(id): PathId,
    Query(query): Query<SubscriptionQuery>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), ApiError> {
    let author = UserRepo::new(&state.pool).by_id(id).await?;
    if author.id == auth.user_id() {
        return Err(ApiError::non_field("You cannot subscribe to yourself."));
    }

    match SubscriptionRepo::new(&state.pool).add(auth.user_id(), id).await {
        Ok(()) => {}
        Err(e) if e.is_already_exists() => {
            return Err(ApiError::non_field(
                "You are already subscribed to this author.",
            ));
        }
        Err(e) => return Err(e.into()),
    }

    info!("User {} subscribed to author {}", auth.user_id(), id);
    let limit = parse_recipes_limit(query.recipes_limit.as_deref());
    let response = subscription_response(&state, &author, limit).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}/subscribe/",
    tag = "Subscriptions",
    params(("id" = i64, Path, description = "Author id")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Was not subscribed"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such user")
    ),
    security(("token_auth" = []))
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    auth: AuthContext,
    PathId(id): PathId,
) -> Result<StatusCode, ApiError> {
    UserRepo::new(&state.pool).by_id(id).await?;
    let removed = SubscriptionRepo::new(&state.pool)
        .remove(auth.user_id(), id)
        .await?;
    if !removed {
        return Err(ApiError::non_field(
            "You are not subscribed to this author.",
        ));
    }
    info!("User {} unsubscribed from author {}", auth.user_id(), id);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/users/subscriptions/",
    tag = "Subscriptions",
    params(
        ("recipes_limit" = Option<i64>, Query, description = "Cap for embedded recipes")
    ),
    responses(
        (status = 200, description = "Authors the user follows", body = SubscriptionPage),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Page out of range")
    ),
    security(("token_auth" = []))
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<SubscriptionQuery>,
) -> Result<Json<Page<SubscriptionResponse>>, ApiError> {
    let page_query = PageQuery {
        page: query.page.clone(),
        limit: query.limit.clone(),
    };
    let pagination = Pagination::from_query(&page_query, state.config.page_size)
        .ok_or_else(ApiError::invalid_page)?;

    let (authors, total) = SubscriptionRepo::new(&state.pool)
        .list_authors(auth.user_id(), &pagination)
        .await?;
    if !pagination.is_valid_page(total) {
        return Err(ApiError::invalid_page());
    }

    let limit = parse_recipes_limit(query.recipes_limit.as_deref());
    let author_ids: Vec<i64> = authors.iter().map(|a| a.id).collect();
    let recipe_repo = RecipeRepo::new(&state.pool);
    let rows = recipe_repo.short_by_authors(&author_ids, limit).await?;
    let counts = recipe_repo.counts_by_authors(&author_ids).await?;

    let mut recipes_by_author: HashMap<i64, Vec<RecipeShortResponse>> = HashMap::new();
    for row in rows {
        recipes_by_author
            .entry(row.author_id)
            .or_default()
            .push(RecipeShortResponse::new(
                row.id,
                &row.name,
                &row.image,
                row.cooking_time,
                &state.config,
            ));
    }

    let results = authors
        .iter()
        .map(|author| {
            SubscriptionResponse::from_author(
                author,
                recipes_by_author.remove(&author.id).unwrap_or_default(),
                counts.get(&author.id).copied().unwrap_or(0),
                &state.config,
            )
        })
        .collect();

    let mut extra: Vec<(&str, String)> = Vec::new();
    if let Some(raw) = query.limit.clone() {
        extra.push(("limit", raw));
    }
    if let Some(raw) = query.recipes_limit.clone() {
        extra.push(("recipes_limit", raw));
    }
    Ok(Json(Page::new(
        results,
        total,
        &pagination,
        &state.config.base_url,
        "/api/users/subscriptions/",
        &extra,
    )))
}

/// Build one author's subscription entry with their recipes attached.
async fn subscription_response(
    state: &AppState,
    author: &User,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionResponse, ApiError> {
    let repo = RecipeRepo::new(&state.pool);
    let rows = repo.short_by_authors(&[author.id], recipes_limit).await?;
    let counts = repo.counts_by_authors(&[author.id]).await?;

    let recipes = rows
        .into_iter()
        .map(|row| {
            RecipeShortResponse::new(row.id, &row.name, &row.image, row.cooking_time, &state.config)
        })
        .collect();
    Ok(SubscriptionResponse::from_author(
        author,
        recipes,
        counts.get(&author.id).copied().unwrap_or(0),
        &state.config,
    ))
}

/// A malformed or negative `recipes_limit` is ignored rather than rejected.
fn parse_recipes_limit(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value >= 0)
}

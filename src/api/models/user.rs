//! User account types and their API representations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::recipe::RecipeShortResponse;
use crate::config::AppConfig;

/// A user row. The password hash never leaves the storage layer boundary
/// in API responses.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User as rendered in API responses. `is_subscribed` is computed against
/// the requesting user and is always false for anonymous callers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserResponse {
    pub fn from_user(user: &User, is_subscribed: bool, config: &AppConfig) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.as_deref().map(|path| config.media_url(path)),
        }
    }
}

/// Registration payload. Fields are optional so missing values surface as
/// per-field validation errors instead of a body-level parse failure.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

/// Registration response; deliberately narrower than [`UserResponse`].
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// A subscribed author: the user fields plus their recipes in short form
/// and the total recipe count.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: i64,
}

impl SubscriptionResponse {
    pub fn from_author(
        author: &User,
        recipes: Vec<RecipeShortResponse>,
        recipes_count: i64,
        config: &AppConfig,
    ) -> Self {
        Self {
            email: author.email.clone(),
            id: author.id,
            username: author.username.clone(),
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            is_subscribed: true,
            avatar: author.avatar.as_deref().map(|path| config.media_url(path)),
            recipes,
            recipes_count,
        }
    }
}

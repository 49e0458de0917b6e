//! Recipe types and their API representations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::tag::Tag;
use super::user::UserResponse;
use crate::config::AppConfig;

/// A recipe row. Tags and ingredients live in join tables and are attached
/// by the storage layer when the full representation is needed.
#[derive(Debug, Clone, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An ingredient line within a recipe: the ingredient fields plus the amount.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe representation, flags computed for the requesting user.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Compact recipe form used in favorites, carts and subscription listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeShortResponse {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeShortResponse {
    pub fn new(id: i64, name: &str, image: &str, cooking_time: i32, config: &AppConfig) -> Self {
        Self {
            id,
            name: name.to_string(),
            image: config.media_url(image),
            cooking_time,
        }
    }

    pub fn from_recipe(recipe: &Recipe, config: &AppConfig) -> Self {
        Self::new(
            recipe.id,
            &recipe.name,
            &recipe.image,
            recipe.cooking_time,
            config,
        )
    }
}

//! Ingredient reference data.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// An ingredient with its measurement unit. Uniqueness is on the
/// `(name, measurement_unit)` pair, so "sugar (g)" and "sugar (tbsp)"
/// are distinct rows.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// Ingredient entry as it appears in seed files for the bulk loader.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientSeed {
    pub name: String,
    pub measurement_unit: String,
}

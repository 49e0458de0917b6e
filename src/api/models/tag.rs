//! Tag reference data.

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// A recipe tag. The database row and the API representation coincide.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

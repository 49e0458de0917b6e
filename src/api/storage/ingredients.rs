//! Ingredient repository.

use sqlx::PgPool;

use super::error::StorageError;
use crate::models::Ingredient;

pub struct IngredientRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> IngredientRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List ingredients, optionally filtered by case-insensitive name prefix.
    pub async fn list(&self, name_prefix: Option<&str>) -> Result<Vec<Ingredient>, StorageError> {
        let ingredients = match name_prefix {
            Some(prefix) if !prefix.is_empty() => {
                sqlx::query_as::<_, Ingredient>(
                    r#"
                    SELECT id, name, measurement_unit
                    FROM ingredients
                    WHERE name ILIKE $1
                    ORDER BY name
                    "#,
                )
                .bind(format!("{}%", escape_like(prefix)))
                .fetch_all(self.pool)
                .await?
            }
            _ => {
                sqlx::query_as::<_, Ingredient>(
                    "SELECT id, name, measurement_unit FROM ingredients ORDER BY name",
                )
                .fetch_all(self.pool)
                .await?
            }
        };
        Ok(ingredients)
    }

    pub async fn by_id(&self, id: i64) -> Result<Ingredient, StorageError> {
        sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("ingredient", id))
    }

    /// Fetch a set of ingredients by id. The caller checks coverage.
    pub async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Ingredient>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(ingredients)
    }

    /// Insert one ingredient, skipping rows that already exist. Returns
    /// whether a row was inserted. Used by the bulk loader.
    pub async fn upsert(&self, name: &str, measurement_unit: &str) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO ingredients (name, measurement_unit)
            VALUES ($1, $2)
            ON CONFLICT (name, measurement_unit) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(measurement_unit)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Escape LIKE wildcards in user input so a literal `%` or `_` in a search
/// term matches itself.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_wildcards() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn upsert_skips_existing() {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for storage tests");
        let pool = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");

        let repo = IngredientRepo::new(&pool);
        let name = format!("test-ingredient-{}", uuid::Uuid::new_v4().simple());

        assert!(repo.upsert(&name, "g").await.unwrap());
        assert!(!repo.upsert(&name, "g").await.unwrap());
        // Same name with a different unit is a distinct ingredient
        assert!(repo.upsert(&name, "kg").await.unwrap());
    }
}

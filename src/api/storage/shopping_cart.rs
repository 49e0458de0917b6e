//! Shopping cart repository.
//!
//! Besides add/remove this is where the cart aggregation lives: one
//! query sums ingredient amounts across every recipe in the cart,
//! grouped by ingredient name and unit.

use sqlx::PgPool;

use super::error::{StorageError, map_constraint_error};

/// One aggregated line of a shopping list.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

pub struct ShoppingCartRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ShoppingCartRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Put a recipe in the cart. `AlreadyExists` on duplicates,
    /// `InvalidReference` when the recipe is gone.
    pub async fn add(&self, user_id: i64, recipe_id: i64) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(recipe_id)
            .execute(self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "shopping cart entry"))?;
        Ok(())
    }

    /// Take a recipe out of the cart. Reports whether it was there.
    pub async fn remove(&self, user_id: i64, recipe_id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Aggregate the user's cart into shopping list lines, summing the
    /// same ingredient across recipes and sorting by name.
    pub async fn aggregate(&self, user_id: i64) -> Result<Vec<ShoppingListItem>, StorageError> {
        let items = sqlx::query_as::<_, ShoppingListItem>(
            r#"
            SELECT i.name, i.measurement_unit, SUM(ri.amount)::BIGINT AS total_amount
            FROM shopping_cart sc
            JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE sc.user_id = $1
            GROUP BY i.name, i.measurement_unit
            ORDER BY i.name, i.measurement_unit
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }
}

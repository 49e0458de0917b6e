//! Favorite recipes repository.

use sqlx::PgPool;

use super::error::{StorageError, map_constraint_error};

pub struct FavoriteRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Mark a recipe as a favorite. `AlreadyExists` on duplicates,
    /// `InvalidReference` when the recipe is gone.
    pub async fn add(&self, user_id: i64, recipe_id: i64) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(recipe_id)
            .execute(self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "favorite"))?;
        Ok(())
    }

    /// Remove a favorite mark. Reports whether one existed.
    pub async fn remove(&self, user_id: i64, recipe_id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::recipes::{NewRecipe, RecipeRepo};
    use crate::storage::users::{NewUser, UserRepo};

    async fn test_pool() -> PgPool {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for storage tests");
        let pool = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
        pool
    }

    async fn seed_user_and_recipe(pool: &PgPool) -> (i64, i64) {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let user = UserRepo::new(pool)
            .create(NewUser {
                email: &format!("fav-{}@example.com", suffix),
                username: &format!("fav-{}", suffix),
                first_name: "Fan",
                last_name: "Person",
                password_hash: "x",
            })
            .await
            .expect("create user");
        let recipe_id = RecipeRepo::new(pool)
            .create(NewRecipe {
                author_id: user.id,
                name: "Toast",
                text: "Toast it.",
                image: "recipes/toast.png",
                cooking_time: 3,
                tag_ids: &[],
                ingredients: &[],
            })
            .await
            .expect("create recipe");
        (user.id, recipe_id)
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn add_twice_is_already_exists() {
        let pool = test_pool().await;
        let repo = FavoriteRepo::new(&pool);
        let (user_id, recipe_id) = seed_user_and_recipe(&pool).await;

        repo.add(user_id, recipe_id).await.expect("first add");
        let err = repo.add(user_id, recipe_id).await.expect_err("duplicate");
        assert!(err.is_already_exists());

        assert!(repo.remove(user_id, recipe_id).await.expect("remove"));
        assert!(!repo.remove(user_id, recipe_id).await.expect("second remove"));
    }
}

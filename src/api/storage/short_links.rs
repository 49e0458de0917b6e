//! Short link repository.
//!
//! Every recipe gets at most one short token. Tokens are random, so the
//! insert retries on collision; a concurrent insert for the same recipe
//! is resolved by reading the winner's token back.

use rand::Rng;
use rand::distributions::Alphanumeric;
use sqlx::PgPool;

use super::error::StorageError;

/// Length of generated short tokens.
pub const TOKEN_LEN: usize = 6;

const MAX_ATTEMPTS: usize = 8;

/// Random alphanumeric token for a short link.
pub fn generate_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub struct ShortLinkRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ShortLinkRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the recipe's short token, allocating one on first use.
    pub async fn get_or_create(&self, recipe_id: i64) -> Result<String, StorageError> {
        if let Some(token) = self.token_for_recipe(recipe_id).await? {
            return Ok(token);
        }

        for _ in 0..MAX_ATTEMPTS {
            let candidate = generate_token(TOKEN_LEN);
            let inserted: Result<Option<(String,)>, sqlx::Error> = sqlx::query_as(
                r#"
                INSERT INTO short_links (recipe_id, token)
                VALUES ($1, $2)
                ON CONFLICT (recipe_id) DO NOTHING
                RETURNING token
                "#,
            )
            .bind(recipe_id)
            .bind(&candidate)
            .fetch_optional(self.pool)
            .await;

            match inserted {
                Ok(Some((token,))) => return Ok(token),
                // Another request created the link for this recipe first
                Ok(None) => {
                    if let Some(token) = self.token_for_recipe(recipe_id).await? {
                        return Ok(token);
                    }
                }
                // Token collision with a different recipe; try a fresh one
                Err(err) if is_unique_violation(&err) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Err(StorageError::Other(format!(
            "could not allocate a unique short link token after {} attempts",
            MAX_ATTEMPTS
        )))
    }

    /// Look up the recipe behind a token.
    pub async fn resolve(&self, token: &str) -> Result<i64, StorageError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT recipe_id FROM short_links WHERE token = $1")
            .bind(token)
            .fetch_optional(self.pool)
            .await?;
        row.map(|(id,)| id)
            .ok_or_else(|| StorageError::not_found("short link", token))
    }

    async fn token_for_recipe(&self, recipe_id: i64) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT token FROM short_links WHERE recipe_id = $1")
                .bind(recipe_id)
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(|(token,)| token))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::recipes::{NewRecipe, RecipeRepo};
    use crate::storage::users::{NewUser, UserRepo};

    #[test]
    fn generated_tokens_are_alphanumeric() {
        let token = generate_token(TOKEN_LEN);
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_tokens_vary() {
        let a = generate_token(16);
        let b = generate_token(16);
        assert_ne!(a, b);
    }

    async fn test_pool() -> PgPool {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for storage tests");
        let pool = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
        pool
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn get_or_create_is_idempotent() {
        let pool = test_pool().await;
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let user = UserRepo::new(&pool)
            .create(NewUser {
                email: &format!("link-{}@example.com", suffix),
                username: &format!("link-{}", suffix),
                first_name: "Link",
                last_name: "Owner",
                password_hash: "x",
            })
            .await
            .expect("create user");
        let recipe_id = RecipeRepo::new(&pool)
            .create(NewRecipe {
                author_id: user.id,
                name: "Linked",
                text: "x",
                image: "recipes/linked.png",
                cooking_time: 5,
                tag_ids: &[],
                ingredients: &[],
            })
            .await
            .expect("create recipe");

        let repo = ShortLinkRepo::new(&pool);
        let first = repo.get_or_create(recipe_id).await.expect("first token");
        let second = repo.get_or_create(recipe_id).await.expect("second token");
        assert_eq!(first, second);
        assert_eq!(first.len(), TOKEN_LEN);

        let resolved = repo.resolve(&first).await.expect("resolve");
        assert_eq!(resolved, recipe_id);

        let missing = repo.resolve("zzzzzz").await;
        assert!(matches!(missing, Err(ref e) if e.is_not_found()));
    }
}

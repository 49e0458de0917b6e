//! Subscription (author follow) repository.

use std::collections::HashSet;

use sqlx::PgPool;

use super::error::{StorageError, map_constraint_error};
use crate::models::{Pagination, User};

pub struct SubscriptionRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a follow edge. Duplicates surface as `AlreadyExists`.
    pub async fn add(&self, user_id: i64, author_id: i64) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(author_id)
            .execute(self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "subscription"))?;
        Ok(())
    }

    /// Remove a follow edge, reporting whether one existed.
    pub async fn remove(&self, user_id: i64, author_id: i64) -> Result<bool, StorageError> {
        let result =
            sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
                .bind(user_id)
                .bind(author_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(&self, user_id: i64, author_id: i64) -> Result<bool, StorageError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists.0)
    }

    /// Which of `author_ids` the user is subscribed to. Batch form used when
    /// annotating user lists and recipe pages.
    pub async fn subscribed_author_ids(
        &self,
        user_id: i64,
        author_ids: &[i64],
    ) -> Result<HashSet<i64>, StorageError> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = ANY($2)",
        )
        .bind(user_id)
        .bind(author_ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Authors the user follows, newest subscription first.
    pub async fn list_authors(
        &self,
        user_id: i64,
        pagination: &Pagination,
    ) -> Result<(Vec<User>, i64), StorageError> {
        #[derive(sqlx::FromRow)]
        struct AuthorRow {
            #[sqlx(flatten)]
            author: User,
            total: i64,
        }

        let rows = sqlx::query_as::<_, AuthorRow>(
            r#"
            SELECT u.id, u.email, u.username, u.first_name, u.last_name,
                   u.password_hash, u.avatar, u.created_at,
                   COUNT(*) OVER() AS total
            FROM subscriptions s
            JOIN users u ON u.id = s.author_id
            WHERE s.user_id = $1
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        let total = match rows.first() {
            Some(row) => row.total,
            None => self.count_for_user(user_id).await?,
        };
        let authors = rows.into_iter().map(|r| r.author).collect();
        Ok((authors, total))
    }

    async fn count_for_user(&self, user_id: i64) -> Result<i64, StorageError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::users::{NewUser, UserRepo};

    async fn test_pool() -> PgPool {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for storage tests");
        let pool = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
        pool
    }

    async fn make_user(pool: &PgPool) -> User {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        UserRepo::new(pool)
            .create(NewUser {
                email: &format!("sub-{}@example.com", suffix),
                username: &format!("sub-{}", suffix),
                first_name: "Test",
                last_name: "User",
                password_hash: "x",
            })
            .await
            .expect("create user")
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn subscribe_and_unsubscribe() {
        let pool = test_pool().await;
        let repo = SubscriptionRepo::new(&pool);
        let user = make_user(&pool).await;
        let author = make_user(&pool).await;

        repo.add(user.id, author.id).await.expect("subscribe");
        assert!(repo.exists(user.id, author.id).await.unwrap());

        let err = repo.add(user.id, author.id).await.expect_err("duplicate");
        assert!(err.is_already_exists());

        assert!(repo.remove(user.id, author.id).await.unwrap());
        assert!(!repo.remove(user.id, author.id).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn self_subscription_blocked_by_check_constraint() {
        let pool = test_pool().await;
        let repo = SubscriptionRepo::new(&pool);
        let user = make_user(&pool).await;

        assert!(repo.add(user.id, user.id).await.is_err());
    }
}

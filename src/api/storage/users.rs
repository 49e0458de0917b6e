//! User repository.

use sqlx::PgPool;

use super::error::{StorageError, map_constraint_error};
use crate::models::{Pagination, User};

/// Fields for a new user row. The password arrives pre-hashed.
pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_user: NewUser<'_>) -> Result<User, StorageError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, username, first_name, last_name, password_hash, avatar, created_at
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.username)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "user"))
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool, StorageError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(self.pool)
                .await?;
        Ok(exists.0)
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool, StorageError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(self.pool)
                .await?;
        Ok(exists.0)
    }

    pub async fn by_id(&self, id: i64) -> Result<User, StorageError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, first_name, last_name, password_hash, avatar, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("user", id))
    }

    pub async fn by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, first_name, last_name, password_hash, avatar, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// List users ordered by registration time. Returns the page plus the
    /// total row count.
    pub async fn list(&self, pagination: &Pagination) -> Result<(Vec<User>, i64), StorageError> {
        #[derive(sqlx::FromRow)]
        struct UserRow {
            #[sqlx(flatten)]
            user: User,
            total: i64,
        }

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, first_name, last_name, password_hash, avatar, created_at,
                   COUNT(*) OVER() AS total
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        // The window total is lost when the page is empty
        let total = match rows.first() {
            Some(row) => row.total,
            None => self.count().await?,
        };
        let users = rows.into_iter().map(|r| r.user).collect();
        Ok((users, total))
    }

    async fn count(&self) -> Result<i64, StorageError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }

    /// Replace the avatar path, returning the previous one so the caller
    /// can clean up the old file.
    pub async fn set_avatar(
        &self,
        id: i64,
        avatar: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        let user = self.by_id(id).await?;
        sqlx::query("UPDATE users SET avatar = $2 WHERE id = $1")
            .bind(id)
            .bind(avatar)
            .execute(self.pool)
            .await?;
        Ok(user.avatar)
    }

    pub async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("user", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> PgPool {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for storage tests");
        let pool = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
        pool
    }

    fn unique(prefix: &str) -> String {
        format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_and_fetch_user() {
        let pool = test_pool().await;
        let repo = UserRepo::new(&pool);

        let email = format!("{}@example.com", unique("user"));
        let username = unique("chef");
        let user = repo
            .create(NewUser {
                email: &email,
                username: &username,
                first_name: "Ada",
                last_name: "Lovelace",
                password_hash: "sha256$1$ab$cd",
            })
            .await
            .expect("create");

        assert_eq!(user.email, email);
        assert!(user.avatar.is_none());

        let fetched = repo.by_id(user.id).await.expect("fetch");
        assert_eq!(fetched.username, username);

        assert!(repo.email_taken(&email).await.unwrap());
        assert!(!repo.email_taken("nobody@example.com").await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_email_is_already_exists() {
        let pool = test_pool().await;
        let repo = UserRepo::new(&pool);

        let email = format!("{}@example.com", unique("dup"));
        let base = NewUser {
            email: &email,
            username: &unique("first"),
            first_name: "A",
            last_name: "B",
            password_hash: "x",
        };
        repo.create(base).await.expect("first insert");

        let err = repo
            .create(NewUser {
                email: &email,
                username: &unique("second"),
                first_name: "A",
                last_name: "B",
                password_hash: "x",
            })
            .await
            .expect_err("duplicate should fail");
        assert!(err.is_already_exists());
    }
}

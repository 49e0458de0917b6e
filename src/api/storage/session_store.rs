//! Session store for PostgreSQL.
//!
//! Every issued token is bound to a session row, so logout can revoke a
//! token before its expiry. A background task clears out expired rows.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::error::StorageError;

/// How long a session (and the token bound to it) stays valid.
const SESSION_DURATION_DAYS: i64 = 7;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Database-backed session store
#[derive(Clone)]
pub struct DbSessionStore {
    pool: PgPool,
}

impl DbSessionStore {
    /// Create a new database session store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new session
    pub async fn create_session(&self, session_id: Uuid, user_id: i64) -> Result<(), StorageError> {
        let expires_at = Utc::now() + Duration::days(SESSION_DURATION_DAYS);
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at, last_activity)
            VALUES ($1, $2, NOW(), $3, NOW())
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a session by ID, ignoring expired rows
    pub async fn get_session(
        &self,
        session_id: Uuid,
    ) -> Result<Option<SessionRecord>, StorageError> {
        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT id, user_id, created_at, expires_at, last_activity
            FROM sessions
            WHERE id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Update session activity timestamp
    pub async fn update_session_activity(&self, session_id: Uuid) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET last_activity = NOW()
            WHERE id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Revoke a session. Revoking an absent session is a no-op.
    pub async fn revoke_session(&self, session_id: Uuid) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Background task that cleans up expired sessions every hour
pub async fn start_session_cleanup_task(pool: PgPool) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));

    loop {
        interval.tick().await;

        match sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
            .execute(&pool)
            .await
        {
            Ok(result) if result.rows_affected() > 0 => {
                tracing::info!("Cleaned up {} expired sessions", result.rows_affected());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Failed to cleanup expired sessions: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::users::{NewUser, UserRepo};

    async fn test_store() -> (DbSessionStore, PgPool) {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for storage tests");
        let pool = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
        (DbSessionStore::new(pool.clone()), pool)
    }

    async fn seed_user(pool: &PgPool) -> i64 {
        let suffix = Uuid::new_v4().simple().to_string();
        UserRepo::new(pool)
            .create(NewUser {
                email: &format!("session-{}@example.com", suffix),
                username: &format!("session-{}", suffix),
                first_name: "Session",
                last_name: "Owner",
                password_hash: "x",
            })
            .await
            .expect("create user")
            .id
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_get_revoke_session() {
        let (store, pool) = test_store().await;
        let user_id = seed_user(&pool).await;
        let session_id = Uuid::new_v4();

        store
            .create_session(session_id, user_id)
            .await
            .expect("create session");

        let record = store
            .get_session(session_id)
            .await
            .expect("get session")
            .expect("session present");
        assert_eq!(record.user_id, user_id);
        assert!(record.expires_at > Utc::now());

        store.revoke_session(session_id).await.expect("revoke");
        let gone = store.get_session(session_id).await.expect("get session");
        assert!(gone.is_none());

        store.revoke_session(session_id).await.expect("revoke again");
    }
}

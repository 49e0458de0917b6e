//! Application state management.
//!
//! Defines the AppState struct that holds everything route handlers
//! share: the connection pool, runtime config, token service, session
//! store and the media writer.

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::services::{ImageService, SharedTokenService, TokenService};
use crate::storage::{DbSessionStore, StorageError};

/// Application state shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Runtime configuration
    pub config: Arc<AppConfig>,
    /// Token issuing and validation
    pub token_service: SharedTokenService,
    /// Database-backed session store for revocable tokens
    pub session_store: DbSessionStore,
    /// Uploaded image writer
    pub images: Arc<ImageService>,
}

impl AppState {
    /// Connect to the database, run migrations and assemble shared state.
    pub async fn init(config: AppConfig) -> Result<Self, StorageError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| StorageError::Other("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::from_parts(pool, config, TokenService::from_env()))
    }

    /// Assemble state from prebuilt parts. Used by `init` and by tests
    /// that bring their own pool and secrets.
    pub fn from_parts(pool: PgPool, config: AppConfig, token_service: TokenService) -> Self {
        let session_store = DbSessionStore::new(pool.clone());
        let images = Arc::new(ImageService::new(config.media_root.clone()));
        Self {
            pool,
            config: Arc::new(config),
            token_service: Arc::new(token_service),
            session_store,
            images,
        }
    }
}

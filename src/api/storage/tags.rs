//! Tag repository. Read-only reference data, listed in name order.

use sqlx::PgPool;

use super::error::StorageError;
use crate::models::Tag;

pub struct TagRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TagRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Tag>, StorageError> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(tags)
    }

    pub async fn by_id(&self, id: i64) -> Result<Tag, StorageError> {
        sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found("tag", id))
    }

    /// Fetch a set of tags by id, preserving name order. The caller checks
    /// the returned set covers every requested id.
    pub async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT id, name, slug FROM tags WHERE id = ANY($1) ORDER BY name",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(tags)
    }
}

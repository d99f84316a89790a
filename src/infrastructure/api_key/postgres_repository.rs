//! PostgreSQL API key repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, NewApiKey};
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::storage::is_unique_violation;

/// PostgreSQL implementation of ApiKeyRepository
#[derive(Debug, Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn get(&self, id: ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, key_prefix, key_hash, created_at, last_used_at
            FROM api_keys
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, key_prefix, key_hash, created_at, last_used_at
            FROM api_keys
            WHERE key_prefix = $1
            "#,
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get API key by prefix: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn create(&self, api_key: NewApiKey) -> Result<ApiKey, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO api_keys (user_id, key_prefix, key_hash)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, key_prefix, key_hash, created_at, last_used_at
            "#,
        )
        .bind(api_key.user_id.value())
        .bind(&api_key.key_prefix)
        .bind(&api_key.key_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                DomainError::user_not_found(api_key.user_id)
            }
            _ if is_unique_violation(&e) => DomainError::conflict(format!(
                "API key with prefix '{}' already exists",
                api_key.key_prefix
            )),
            _ => DomainError::storage(format!("Failed to create API key: {}", e)),
        })?;

        row_to_api_key(&row)
    }

    async fn delete(&self, id: ApiKeyId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API key: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ApiKey>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, key_prefix, key_hash, created_at, last_used_at
            FROM api_keys
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list API keys: {}", e)))?;

        rows.iter().map(row_to_api_key).collect()
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE user_id = $1")
            .bind(user_id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API keys: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }

    async fn record_usage(&self, id: ApiKeyId) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to record API key usage: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("API key '{}' not found", id)));
        }

        Ok(())
    }
}

fn row_to_api_key(row: &sqlx::postgres::PgRow) -> Result<ApiKey, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Invalid API key row: {}", e));

    let id: i64 = row.try_get("id").map_err(read)?;
    let user_id: i64 = row.try_get("user_id").map_err(read)?;
    let key_prefix: String = row.try_get("key_prefix").map_err(read)?;
    let key_hash: String = row.try_get("key_hash").map_err(read)?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at").map_err(read)?;
    let last_used_at: Option<chrono::DateTime<chrono::Utc>> =
        row.try_get("last_used_at").map_err(read)?;

    Ok(ApiKey::restore(
        ApiKeyId::new(id),
        UserId::new(user_id),
        key_prefix,
        key_hash,
        created_at,
        last_used_at,
    ))
}

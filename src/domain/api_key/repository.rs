//! API Key repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{ApiKey, ApiKeyId, NewApiKey};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Repository trait for API key storage
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    /// Get an API key by its ID
    async fn get(&self, id: ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// Get an API key by its key prefix (for lookup during authentication)
    async fn get_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>, DomainError>;

    /// Persist a new API key, assigning its ID
    async fn create(&self, api_key: NewApiKey) -> Result<ApiKey, DomainError>;

    /// Delete an API key
    async fn delete(&self, id: ApiKeyId) -> Result<bool, DomainError>;

    /// Keys owned by a user, ordered by ID
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ApiKey>, DomainError>;

    /// Remove every key of a user, returns the number removed
    async fn delete_for_user(&self, user_id: UserId) -> Result<usize, DomainError>;

    /// Record usage of an API key
    async fn record_usage(&self, id: ApiKeyId) -> Result<(), DomainError>;
}

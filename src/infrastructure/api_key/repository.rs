//! In-memory API key repository implementation

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, NewApiKey};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// In-memory implementation of ApiKeyRepository
#[derive(Debug)]
pub struct InMemoryApiKeyRepository {
    keys: RwLock<BTreeMap<ApiKeyId, ApiKey>>,
    next_id: AtomicI64,
}

impl InMemoryApiKeyRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryApiKeyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn get(&self, id: ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.get(&id).cloned())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.values().find(|k| k.key_prefix() == prefix).cloned())
    }

    async fn create(&self, api_key: NewApiKey) -> Result<ApiKey, DomainError> {
        let mut keys = self.keys.write().await;

        if keys.values().any(|k| k.key_prefix() == api_key.key_prefix) {
            return Err(DomainError::conflict(format!(
                "API key with prefix '{}' already exists",
                api_key.key_prefix
            )));
        }

        let id = ApiKeyId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let api_key = api_key.into_api_key(id);
        keys.insert(id, api_key.clone());

        Ok(api_key)
    }

    async fn delete(&self, id: ApiKeyId) -> Result<bool, DomainError> {
        let mut keys = self.keys.write().await;
        Ok(keys.remove(&id).is_some())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ApiKey>, DomainError> {
        let keys = self.keys.read().await;

        Ok(keys
            .values()
            .filter(|k| k.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<usize, DomainError> {
        let mut keys = self.keys.write().await;
        let before = keys.len();

        keys.retain(|_, k| k.user_id() != user_id);

        Ok(before - keys.len())
    }

    async fn record_usage(&self, id: ApiKeyId) -> Result<(), DomainError> {
        let mut keys = self.keys.write().await;

        if let Some(key) = keys.get_mut(&id) {
            key.record_usage();
            Ok(())
        } else {
            Err(DomainError::not_found(format!("API key '{}' not found", id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_key(user_id: i64, prefix: &str) -> NewApiKey {
        NewApiKey {
            user_id: UserId::new(user_id),
            key_prefix: prefix.to_string(),
            key_hash: format!("sha256${}", prefix),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryApiKeyRepository::new();

        let key = repo.create(new_key(1, "uk_live_aaaaaaaa")).await.unwrap();

        assert_eq!(key.id(), ApiKeyId::new(1));
        assert_eq!(repo.get(key.id()).await.unwrap(), Some(key.clone()));
        assert_eq!(
            repo.get_by_prefix("uk_live_aaaaaaaa").await.unwrap(),
            Some(key)
        );
    }

    #[tokio::test]
    async fn test_duplicate_prefix() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(new_key(1, "uk_live_aaaaaaaa")).await.unwrap();

        let result = repo.create(new_key(2, "uk_live_aaaaaaaa")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_list_and_delete_for_user() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(new_key(1, "uk_live_aaaaaaaa")).await.unwrap();
        repo.create(new_key(1, "uk_live_bbbbbbbb")).await.unwrap();
        repo.create(new_key(2, "uk_live_cccccccc")).await.unwrap();

        assert_eq!(repo.list_for_user(UserId::new(1)).await.unwrap().len(), 2);
        assert_eq!(repo.delete_for_user(UserId::new(1)).await.unwrap(), 2);
        assert!(repo.list_for_user(UserId::new(1)).await.unwrap().is_empty());
        assert_eq!(repo.list_for_user(UserId::new(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_usage() {
        let repo = InMemoryApiKeyRepository::new();
        let key = repo.create(new_key(1, "uk_live_aaaaaaaa")).await.unwrap();

        repo.record_usage(key.id()).await.unwrap();

        let used = repo.get(key.id()).await.unwrap().unwrap();
        assert!(used.last_used_at().is_some());
        assert!(repo.record_usage(ApiKeyId::new(42)).await.is_err());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryApiKeyRepository::new();
        let key = repo.create(new_key(1, "uk_live_aaaaaaaa")).await.unwrap();

        assert!(repo.delete(key.id()).await.unwrap());
        assert!(!repo.delete(key.id()).await.unwrap());
    }
}

//! Storage factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageBackend, StorageSettings};
use crate::domain::api_key::ApiKeyRepository;
use crate::domain::role::RoleRepository;
use crate::domain::user::UserRepository;
use crate::domain::DomainError;
use crate::infrastructure::api_key::{InMemoryApiKeyRepository, PostgresApiKeyRepository};
use crate::infrastructure::role::{InMemoryRoleRepository, PostgresRoleRepository};
use crate::infrastructure::user::{InMemoryUserRepository, PostgresUserRepository};

use super::migrations::run_migrations;
use super::postgres::connect_pool;

/// The three stores backing the user module, all on the same backend
#[derive(Debug, Clone)]
pub struct UserStores {
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub api_keys: Arc<dyn ApiKeyRepository>,
}

impl UserStores {
    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            roles: Arc::new(InMemoryRoleRepository::new()),
            api_keys: Arc::new(InMemoryApiKeyRepository::new()),
        }
    }
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates the stores for the configured backend.
    ///
    /// The Postgres backend connects and applies pending migrations first.
    pub async fn create(settings: &StorageSettings) -> Result<UserStores, DomainError> {
        match settings.backend {
            StorageBackend::InMemory => {
                info!("Using in-memory storage");
                Ok(UserStores::in_memory())
            }
            StorageBackend::Postgres => {
                let pool = connect_pool(&settings.postgres).await?;
                run_migrations(&pool).await?;

                Ok(UserStores {
                    users: Arc::new(PostgresUserRepository::new(pool.clone())),
                    roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
                    api_keys: Arc::new(PostgresApiKeyRepository::new(pool)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_settings_use_in_memory_stores() {
        let stores = StorageFactory::create(&StorageSettings::default()).await.unwrap();

        assert_eq!(stores.users.count().await.unwrap(), 0);
        assert!(stores.roles.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_in_memory_stores_are_independent() {
        let first = UserStores::in_memory();
        let second = UserStores::in_memory();

        assert!(!Arc::ptr_eq(&first.users, &second.users));
    }
}

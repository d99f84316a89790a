//! PMP Users
//!
//! User lifecycle management with support for:
//! - User creation, update and deletion with lifecycle events
//! - Role assignment and role set synchronization
//! - Argon2 credential hashing and credential lookup
//! - Per-user API keys
//! - In-memory and PostgreSQL storage

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;

use crate::config::SecurityConfig;
use crate::domain::event::EventDispatcher;
use crate::domain::DomainError;
use crate::infrastructure::{
    api_key::ApiKeyGenerator,
    role::RoleService,
    storage::{StorageFactory, UserStores},
    user::{Argon2Hasher, UserService},
};
use tracing::info;

/// The user and role services sharing one set of stores
#[derive(Debug)]
pub struct UserModule {
    pub users: UserService,
    pub roles: RoleService,
}

impl UserModule {
    /// Wire services over existing stores
    pub fn from_stores(
        stores: UserStores,
        security: &SecurityConfig,
        events: Arc<dyn EventDispatcher>,
    ) -> Result<Self, DomainError> {
        let hasher = Argon2Hasher::from_settings(&security.argon2)?;

        let users = UserService::new(
            stores.users,
            stores.roles.clone(),
            stores.api_keys,
            Arc::new(hasher),
            events,
        )
        .with_key_generator(ApiKeyGenerator::new(&security.api_key_prefix));

        Ok(Self {
            users,
            roles: RoleService::new(stores.roles),
        })
    }
}

/// Create the user module for the configured storage backend
pub async fn create_user_module(
    config: &AppConfig,
    events: Arc<dyn EventDispatcher>,
) -> Result<UserModule, DomainError> {
    let stores = StorageFactory::create(&config.storage).await?;
    let module = UserModule::from_stores(stores, &config.security, events)?;

    info!(backend = ?config.storage.backend, "User module initialized");
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Argon2Settings;
    use crate::infrastructure::event::RecordingEventDispatcher;
    use crate::infrastructure::role::CreateRoleRequest;
    use crate::infrastructure::user::CreateUserRequest;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.security.api_key_prefix = "uk_test_".to_string();
        config.security.argon2 = Argon2Settings {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        config
    }

    #[tokio::test]
    async fn test_module_shares_stores_between_services() {
        let events = Arc::new(RecordingEventDispatcher::new());
        let module = create_user_module(&test_config(), events.clone()).await.unwrap();

        let role = module.roles.create(CreateRoleRequest::new("User")).await.unwrap();
        let user = module
            .users
            .create_with_roles(CreateUserRequest::new("jane@doe.com", "demo1234"), ["user"])
            .await
            .unwrap();

        assert_eq!(module.roles.users_with_role(role.id()).await.unwrap(), 1);
        assert_eq!(events.events().await.len(), 1);

        let issued = module.users.issue_api_key(user.id()).await.unwrap();
        assert!(issued.key.starts_with("uk_test_"));
    }

    #[test]
    fn test_invalid_argon2_settings() {
        let mut config = test_config();
        config.security.argon2.iterations = 0;

        let result = UserModule::from_stores(
            UserStores::in_memory(),
            &config.security,
            Arc::new(RecordingEventDispatcher::new()),
        );

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}

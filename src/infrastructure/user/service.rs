//! User service: validation, hashing, persistence, role assignment and
//! lifecycle events for user records

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, IssuedApiKey, NewApiKey};
use crate::domain::event::{EventDispatcher, UserEvent};
use crate::domain::role::{slugify, Role, RoleId, RoleRef, RoleRepository};
use crate::domain::user::{
    normalize_email, validate_email, validate_name, validate_password, NewUser, User, UserId,
    UserRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::api_key::ApiKeyGenerator;

use super::password::PasswordHasher;

/// Request for creating a new user
#[derive(Debug, Clone, Default)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub activated: bool,
}

impl CreateUserRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    pub fn activated(mut self, activated: bool) -> Self {
        self.activated = activated;
        self
    }
}

/// Changes to apply to a user. `None` leaves a field untouched; an empty
/// first/last name clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub activated: Option<bool>,
}

impl UpdateUserRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn activated(mut self, activated: bool) -> Self {
        self.activated = Some(activated);
        self
    }
}

/// Email/password pair presented for a credential lookup
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Which lifecycle event a creation path announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Announce {
    Created,
    Registered,
    Silent,
}

/// Validated, hashed field changes waiting to be applied
struct PendingChanges {
    email: Option<String>,
    password_hash: Option<String>,
    first_name: Option<Option<String>>,
    last_name: Option<Option<String>>,
    activated: Option<bool>,
}

/// User service for user lifecycle management
pub struct UserService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    api_keys: Arc<dyn ApiKeyRepository>,
    hasher: Arc<dyn PasswordHasher>,
    events: Arc<dyn EventDispatcher>,
    key_generator: ApiKeyGenerator,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("users", &self.users)
            .field("roles", &self.roles)
            .field("api_keys", &self.api_keys)
            .field("hasher", &self.hasher)
            .field("key_generator", &self.key_generator)
            .finish_non_exhaustive()
    }
}

impl UserService {
    /// Create a new user service
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        api_keys: Arc<dyn ApiKeyRepository>,
        hasher: Arc<dyn PasswordHasher>,
        events: Arc<dyn EventDispatcher>,
    ) -> Self {
        Self {
            users,
            roles,
            api_keys,
            hasher,
            events,
            key_generator: ApiKeyGenerator::default(),
        }
    }

    /// Use a custom API key generator
    pub fn with_key_generator(mut self, key_generator: ApiKeyGenerator) -> Self {
        self.key_generator = key_generator;
        self
    }

    // Creation

    /// Create a user.
    ///
    /// Emits `UserHasRegistered` when `fire_registered_event` is set and
    /// `UserWasCreated` otherwise.
    pub async fn create(
        &self,
        request: CreateUserRequest,
        fire_registered_event: bool,
    ) -> Result<User, DomainError> {
        let announce = if fire_registered_event {
            Announce::Registered
        } else {
            Announce::Created
        };

        self.create_user(request, Vec::new(), announce).await
    }

    /// Create a user and assign the given roles; emits `UserWasCreated`
    pub async fn create_with_roles<I, R>(
        &self,
        request: CreateUserRequest,
        roles: I,
    ) -> Result<User, DomainError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        let roles = roles.into_iter().map(Into::into).collect();
        self.create_user(request, roles, Announce::Created).await
    }

    /// Same data effects as [`Self::create_with_roles`] without any lifecycle event.
    ///
    /// Meant for administrative, unattended creation.
    pub async fn create_with_roles_from_cli<I, R>(
        &self,
        request: CreateUserRequest,
        roles: I,
    ) -> Result<User, DomainError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        let roles = roles.into_iter().map(Into::into).collect();
        self.create_user(request, roles, Announce::Silent).await
    }

    async fn create_user(
        &self,
        request: CreateUserRequest,
        roles: Vec<RoleRef>,
        announce: Announce,
    ) -> Result<User, DomainError> {
        let new_user = self.prepare_new_user(request).await?;
        let role_ids = self.resolve_roles(&roles).await?;

        let user = self.users.create(new_user).await?;
        self.issue_key(user.id()).await?;

        if !role_ids.is_empty() {
            self.roles.attach(user.id(), &role_ids).await?;
        }

        info!(user_id = %user.id(), roles = role_ids.len(), "Created user");

        match announce {
            Announce::Created => {
                self.events
                    .dispatch(UserEvent::UserWasCreated(user.clone()))
                    .await?
            }
            Announce::Registered => {
                self.events
                    .dispatch(UserEvent::UserHasRegistered(user.clone()))
                    .await?
            }
            Announce::Silent => debug!(user_id = %user.id(), "Lifecycle events suppressed"),
        }

        Ok(user)
    }

    async fn prepare_new_user(&self, request: CreateUserRequest) -> Result<NewUser, DomainError> {
        let email = validate_email(&request.email).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_password(&request.password).map_err(|e| DomainError::validation(e.to_string()))?;
        let first_name = validate_name("first_name", request.first_name.as_deref())
            .map_err(|e| DomainError::validation(e.to_string()))?;
        let last_name = validate_name("last_name", request.last_name.as_deref())
            .map_err(|e| DomainError::validation(e.to_string()))?;

        if self.users.email_exists(&email).await? {
            return Err(DomainError::conflict(format!("Email '{}' already exists", email)));
        }

        let password_hash = self.hasher.hash(&request.password)?;

        Ok(NewUser {
            email,
            password_hash,
            first_name,
            last_name,
            activated: request.activated,
        })
    }

    // Lookup

    /// Get a user by ID
    pub async fn find(&self, id: UserId) -> Result<User, DomainError> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    /// Get a user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.users.get_by_email(&normalize_email(email)).await
    }

    /// All users, ordered by ID
    pub async fn all(&self) -> Result<Vec<User>, DomainError> {
        self.users.list().await
    }

    /// Count users
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.users.count().await
    }

    /// Roles currently assigned to a user
    pub async fn roles(&self, id: UserId) -> Result<Vec<Role>, DomainError> {
        self.find(id).await?;
        self.roles.roles_for_user(id).await
    }

    /// API keys owned by a user
    pub async fn api_keys(&self, id: UserId) -> Result<Vec<ApiKey>, DomainError> {
        self.find(id).await?;
        self.api_keys.list_for_user(id).await
    }

    // Update

    /// Apply changes to a user.
    ///
    /// Emits `UserIsUpdating` with the stored state before persisting and
    /// `UserWasUpdated` with the persisted state afterwards. Nothing is emitted
    /// when validation fails.
    pub async fn update(&self, user: &User, request: UpdateUserRequest) -> Result<User, DomainError> {
        let current = self.find(user.id()).await?;
        self.apply_update(current, request).await
    }

    /// Update a user and replace its whole role set with `roles`
    pub async fn update_and_sync_roles<I, R>(
        &self,
        id: UserId,
        request: UpdateUserRequest,
        roles: I,
    ) -> Result<User, DomainError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        let current = self.find(id).await?;
        let roles: Vec<RoleRef> = roles.into_iter().map(Into::into).collect();
        let role_ids = self.resolve_roles(&roles).await?;

        let updated = self.apply_update(current, request).await?;
        let sync = self.roles.sync(id, &role_ids).await?;

        if sync.is_noop() {
            debug!(user_id = %id, "Role set unchanged");
        } else {
            info!(
                user_id = %id,
                attached = sync.attached.len(),
                detached = sync.detached.len(),
                "Synced user roles"
            );
        }

        Ok(updated)
    }

    async fn apply_update(&self, current: User, request: UpdateUserRequest) -> Result<User, DomainError> {
        let changes = self.prepare_changes(&current, request).await?;

        self.events
            .dispatch(UserEvent::UserIsUpdating(current.clone()))
            .await?;

        let mut user = current;

        if let Some(email) = changes.email {
            user.set_email(email);
        }

        if let Some(password_hash) = changes.password_hash {
            user.set_password_hash(password_hash);
        }

        if let Some(first_name) = changes.first_name {
            user.set_first_name(first_name);
        }

        if let Some(last_name) = changes.last_name {
            user.set_last_name(last_name);
        }

        if let Some(activated) = changes.activated {
            user.set_activated(activated);
        }

        let updated = self.users.update(&user).await?;
        info!(user_id = %updated.id(), "Updated user");

        self.events
            .dispatch(UserEvent::UserWasUpdated(updated.clone()))
            .await?;

        Ok(updated)
    }

    async fn prepare_changes(
        &self,
        current: &User,
        request: UpdateUserRequest,
    ) -> Result<PendingChanges, DomainError> {
        let email = match request.email {
            Some(email) => {
                let email = validate_email(&email).map_err(|e| DomainError::validation(e.to_string()))?;

                if email != current.email() && self.users.email_exists(&email).await? {
                    return Err(DomainError::conflict(format!("Email '{}' already exists", email)));
                }

                Some(email)
            }
            None => None,
        };

        let first_name = request
            .first_name
            .map(|name| validate_name("first_name", Some(name.as_str())))
            .transpose()
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let last_name = request
            .last_name
            .map(|name| validate_name("last_name", Some(name.as_str())))
            .transpose()
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let password_hash = match request.password {
            Some(password) => {
                validate_password(&password).map_err(|e| DomainError::validation(e.to_string()))?;
                Some(self.hasher.hash(&password)?)
            }
            None => None,
        };

        Ok(PendingChanges {
            email,
            password_hash,
            first_name,
            last_name,
            activated: request.activated,
        })
    }

    // Deletion

    /// Delete a user together with its role links and API keys
    pub async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        self.find(id).await?;

        let detached = self.roles.detach_all(id).await?;
        let revoked = self.api_keys.delete_for_user(id).await?;

        if !self.users.delete(id).await? {
            return Err(DomainError::user_not_found(id));
        }

        info!(user_id = %id, detached, revoked, "Deleted user");
        Ok(())
    }

    // Credentials

    /// Find the user matching an email/password pair.
    ///
    /// An unknown email and a wrong password fail the same way.
    pub async fn find_by_credentials(&self, credentials: &Credentials) -> Result<User, DomainError> {
        let email = normalize_email(&credentials.email);

        match self.users.get_by_email(&email).await? {
            Some(user) if self.hasher.verify(&credentials.password, user.password_hash()) => Ok(user),
            _ => {
                warn!(email = %email, "Credential check failed");
                Err(DomainError::not_found("No user matches the given credentials"))
            }
        }
    }

    /// Check credentials for an activated user and record the login
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Option<User>, DomainError> {
        let user = match self.find_by_credentials(credentials).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        if !user.is_activated() {
            debug!(user_id = %user.id(), "Login refused for inactive user");
            return Ok(None);
        }

        self.users.record_login(user.id()).await?;

        // Re-fetch user to get updated last_login_at
        self.users.get(user.id()).await
    }

    // API keys

    /// Issue an additional API key; the returned plaintext is not stored
    pub async fn issue_api_key(&self, id: UserId) -> Result<IssuedApiKey, DomainError> {
        self.find(id).await?;
        self.issue_key(id).await
    }

    async fn issue_key(&self, user_id: UserId) -> Result<IssuedApiKey, DomainError> {
        let generated = self.key_generator.generate();

        let api_key = self
            .api_keys
            .create(NewApiKey {
                user_id,
                key_prefix: generated.prefix,
                key_hash: generated.hash,
            })
            .await?;

        debug!(user_id = %user_id, key_prefix = %api_key.key_prefix(), "Issued API key");

        Ok(IssuedApiKey {
            api_key,
            key: generated.key,
        })
    }

    /// Revoke one of a user's API keys
    pub async fn revoke_api_key(&self, id: UserId, key_id: ApiKeyId) -> Result<(), DomainError> {
        let owned = self
            .api_keys
            .get(key_id)
            .await?
            .filter(|key| key.user_id() == id);

        if owned.is_none() || !self.api_keys.delete(key_id).await? {
            return Err(DomainError::not_found(format!(
                "API key '{}' not found for user '{}'",
                key_id, id
            )));
        }

        info!(user_id = %id, key_id = %key_id, "Revoked API key");
        Ok(())
    }

    /// Resolve the owner of a presented API key and record the key's usage
    pub async fn find_by_api_key(&self, key: &str) -> Result<User, DomainError> {
        let invalid = || DomainError::not_found("Invalid API key");

        let prefix = self.key_generator.prefix_of(key).ok_or_else(invalid)?;

        let api_key = self
            .api_keys
            .get_by_prefix(prefix)
            .await?
            .filter(|stored| self.key_generator.verify_key(key, stored.key_hash()))
            .ok_or_else(invalid)?;

        self.api_keys.record_usage(api_key.id()).await?;
        self.find(api_key.user_id()).await
    }

    // Roles

    /// Resolve role references to IDs, dropping duplicates and keeping order
    async fn resolve_roles(&self, roles: &[RoleRef]) -> Result<Vec<RoleId>, DomainError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(roles.len());

        for reference in roles {
            let role = match reference {
                RoleRef::Id(id) => self.roles.get(*id).await?,
                RoleRef::Name(name) => match self.roles.get_by_name(name).await? {
                    Some(role) => Some(role),
                    None => self.roles.get_by_slug(&slugify(name)).await?,
                },
            };

            let role = role
                .ok_or_else(|| DomainError::not_found(format!("Role '{}' not found", reference)))?;

            if seen.insert(role.id()) {
                resolved.push(role.id());
            }
        }

        Ok(resolved)
    }
}

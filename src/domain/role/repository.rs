//! Role repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{NewRole, Role, RoleId, RoleSync};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Repository for roles and the user-role membership links
#[async_trait]
pub trait RoleRepository: Send + Sync + Debug {
    /// Get a role by ID
    async fn get(&self, id: RoleId) -> Result<Option<Role>, DomainError>;

    /// Get a role by its slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Role>, DomainError>;

    /// Get a role by its exact name
    async fn get_by_name(&self, name: &str) -> Result<Option<Role>, DomainError>;

    /// Persist a new role, assigning its ID
    async fn create(&self, role: NewRole) -> Result<Role, DomainError>;

    /// Update an existing role
    async fn update(&self, role: &Role) -> Result<Role, DomainError>;

    /// Delete a role and every membership link pointing at it
    async fn delete(&self, id: RoleId) -> Result<bool, DomainError>;

    /// List all roles ordered by ID
    async fn list(&self) -> Result<Vec<Role>, DomainError>;

    /// Roles currently linked to a user, ordered by ID
    async fn roles_for_user(&self, user_id: UserId) -> Result<Vec<Role>, DomainError>;

    /// Link roles to a user; links that already exist are kept as they are
    async fn attach(&self, user_id: UserId, roles: &[RoleId]) -> Result<(), DomainError>;

    /// Replace the user's role set with exactly `roles` in one operation
    async fn sync(&self, user_id: UserId, roles: &[RoleId]) -> Result<RoleSync, DomainError>;

    /// Remove every role link of a user, returns the number removed
    async fn detach_all(&self, user_id: UserId) -> Result<usize, DomainError>;

    /// Number of users holding a role
    async fn count_users(&self, id: RoleId) -> Result<usize, DomainError>;
}

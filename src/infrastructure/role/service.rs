//! Role service: creation, lookup, rename and deletion of roles

use std::sync::Arc;

use tracing::info;

use crate::domain::role::{NewRole, Role, RoleId, RoleRepository};
use crate::domain::DomainError;

/// Request for creating a new role; the slug is derived from the name when absent
#[derive(Debug, Clone)]
pub struct CreateRoleRequest {
    pub name: String,
    pub slug: Option<String>,
}

impl CreateRoleRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}

/// Role service for role management
#[derive(Debug, Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleRepository>,
}

impl RoleService {
    /// Create a new role service
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        Self { roles }
    }

    /// Create a role
    pub async fn create(&self, request: CreateRoleRequest) -> Result<Role, DomainError> {
        let new_role = NewRole::new(&request.name, request.slug.as_deref())
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let role = self.roles.create(new_role).await?;
        info!(role_id = %role.id(), slug = %role.slug(), "Created role");

        Ok(role)
    }

    /// Get a role by ID
    pub async fn find(&self, id: RoleId) -> Result<Role, DomainError> {
        self.roles
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Role '#{}' not found", id)))
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Role>, DomainError> {
        self.roles.get_by_slug(slug).await
    }

    /// All roles, ordered by ID
    pub async fn all(&self) -> Result<Vec<Role>, DomainError> {
        self.roles.list().await
    }

    /// Rename a role; its slug follows the new name
    pub async fn rename(&self, id: RoleId, name: &str) -> Result<Role, DomainError> {
        let mut role = self.find(id).await?;

        role.rename(name)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let role = self.roles.update(&role).await?;
        info!(role_id = %id, slug = %role.slug(), "Renamed role");

        Ok(role)
    }

    /// Delete a role and detach it from every user
    pub async fn delete(&self, id: RoleId) -> Result<(), DomainError> {
        if !self.roles.delete(id).await? {
            return Err(DomainError::not_found(format!("Role '#{}' not found", id)));
        }

        info!(role_id = %id, "Deleted role");
        Ok(())
    }

    /// Number of users holding a role
    pub async fn users_with_role(&self, id: RoleId) -> Result<usize, DomainError> {
        self.find(id).await?;
        self.roles.count_users(id).await
    }
}

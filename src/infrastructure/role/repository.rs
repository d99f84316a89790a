//! In-memory role repository implementation

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::domain::role::{NewRole, Role, RoleId, RoleRepository, RoleSync};
use crate::domain::user::UserId;
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct RoleTable {
    roles: BTreeMap<RoleId, Role>,
    /// Membership links, ordered so per-user scans are range queries
    links: BTreeSet<(UserId, RoleId)>,
}

impl RoleTable {
    fn role_ids_for(&self, user_id: UserId) -> Vec<RoleId> {
        let lower = (user_id, RoleId::new(i64::MIN));
        let upper = (user_id, RoleId::new(i64::MAX));

        self.links
            .range(lower..=upper)
            .map(|(_, role_id)| *role_id)
            .collect()
    }

    fn ensure_roles_exist(&self, roles: &[RoleId]) -> Result<(), DomainError> {
        match roles.iter().find(|id| !self.roles.contains_key(id)) {
            Some(missing) => Err(DomainError::not_found(format!(
                "Role '#{}' not found",
                missing
            ))),
            None => Ok(()),
        }
    }

    fn check_unique(&self, role_id: Option<RoleId>, name: &str, slug: &str) -> Result<(), DomainError> {
        let clash = self
            .roles
            .values()
            .filter(|r| Some(r.id()) != role_id)
            .find(|r| r.name() == name || r.slug() == slug);

        match clash {
            Some(existing) => Err(DomainError::conflict(format!(
                "Role '{}' already exists",
                existing.name()
            ))),
            None => Ok(()),
        }
    }
}

/// In-memory implementation of RoleRepository
///
/// Roles and membership links share one lock, so a sync is applied as a
/// single step.
#[derive(Debug)]
pub struct InMemoryRoleRepository {
    table: RwLock<RoleTable>,
    next_id: AtomicI64,
}

impl InMemoryRoleRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            table: RwLock::new(RoleTable::default()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryRoleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn get(&self, id: RoleId) -> Result<Option<Role>, DomainError> {
        let table = self.table.read().await;
        Ok(table.roles.get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Role>, DomainError> {
        let table = self.table.read().await;
        Ok(table.roles.values().find(|r| r.slug() == slug).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Role>, DomainError> {
        let table = self.table.read().await;
        Ok(table.roles.values().find(|r| r.name() == name).cloned())
    }

    async fn create(&self, role: NewRole) -> Result<Role, DomainError> {
        let mut table = self.table.write().await;
        table.check_unique(None, role.name(), role.slug())?;

        let id = RoleId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let role = role.into_role(id);
        table.roles.insert(id, role.clone());

        Ok(role)
    }

    async fn update(&self, role: &Role) -> Result<Role, DomainError> {
        let mut table = self.table.write().await;

        if !table.roles.contains_key(&role.id()) {
            return Err(DomainError::not_found(format!(
                "Role '#{}' not found",
                role.id()
            )));
        }

        table.check_unique(Some(role.id()), role.name(), role.slug())?;
        table.roles.insert(role.id(), role.clone());

        Ok(role.clone())
    }

    async fn delete(&self, id: RoleId) -> Result<bool, DomainError> {
        let mut table = self.table.write().await;

        if table.roles.remove(&id).is_none() {
            return Ok(false);
        }

        table.links.retain(|(_, role_id)| *role_id != id);
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<Role>, DomainError> {
        let table = self.table.read().await;
        Ok(table.roles.values().cloned().collect())
    }

    async fn roles_for_user(&self, user_id: UserId) -> Result<Vec<Role>, DomainError> {
        let table = self.table.read().await;

        Ok(table
            .role_ids_for(user_id)
            .iter()
            .filter_map(|id| table.roles.get(id).cloned())
            .collect())
    }

    async fn attach(&self, user_id: UserId, roles: &[RoleId]) -> Result<(), DomainError> {
        let mut table = self.table.write().await;
        table.ensure_roles_exist(roles)?;

        for role_id in roles {
            table.links.insert((user_id, *role_id));
        }

        Ok(())
    }

    async fn sync(&self, user_id: UserId, roles: &[RoleId]) -> Result<RoleSync, DomainError> {
        let mut table = self.table.write().await;
        table.ensure_roles_exist(roles)?;

        let sync = RoleSync::between(&table.role_ids_for(user_id), roles);

        for role_id in &sync.detached {
            table.links.remove(&(user_id, *role_id));
        }

        for role_id in &sync.attached {
            table.links.insert((user_id, *role_id));
        }

        Ok(sync)
    }

    async fn detach_all(&self, user_id: UserId) -> Result<usize, DomainError> {
        let mut table = self.table.write().await;
        let before = table.links.len();

        table.links.retain(|(owner, _)| *owner != user_id);

        Ok(before - table.links.len())
    }

    async fn count_users(&self, id: RoleId) -> Result<usize, DomainError> {
        let table = self.table.read().await;
        Ok(table.links.iter().filter(|(_, role_id)| *role_id == id).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(names: &[&str]) -> InMemoryRoleRepository {
        let repo = InMemoryRoleRepository::new();

        for name in names {
            repo.create(NewRole::new(name, None).unwrap()).await.unwrap();
        }

        repo
    }

    fn ids(raw: &[i64]) -> Vec<RoleId> {
        raw.iter().copied().map(RoleId::new).collect()
    }

    fn role_ids(roles: &[Role]) -> Vec<RoleId> {
        roles.iter().map(Role::id).collect()
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = seeded(&["User", "Super Admin"]).await;

        let admin = repo.get_by_slug("super-admin").await.unwrap().unwrap();
        assert_eq!(admin.id(), RoleId::new(2));
        assert_eq!(admin.name(), "Super Admin");

        let user = repo.get_by_name("User").await.unwrap().unwrap();
        assert_eq!(user.slug(), "user");

        assert!(repo.get(RoleId::new(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_or_slug() {
        let repo = seeded(&["Admin"]).await;

        let result = repo.create(NewRole::new("Admin", None).unwrap()).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));

        // Different name, same slug
        let result = repo.create(NewRole::new("admin!", None).unwrap()).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_attach_is_additive() {
        let repo = seeded(&["User", "Admin"]).await;
        let user_id = UserId::new(1);

        repo.attach(user_id, &ids(&[1])).await.unwrap();
        repo.attach(user_id, &ids(&[1, 2])).await.unwrap();

        let roles = repo.roles_for_user(user_id).await.unwrap();
        assert_eq!(role_ids(&roles), ids(&[1, 2]));
    }

    #[tokio::test]
    async fn test_attach_unknown_role_changes_nothing() {
        let repo = seeded(&["User"]).await;
        let user_id = UserId::new(1);

        let result = repo.attach(user_id, &ids(&[1, 7])).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert!(repo.roles_for_user(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_replaces_role_set() {
        let repo = seeded(&["User", "Admin"]).await;
        let user_id = UserId::new(1);
        repo.attach(user_id, &ids(&[1])).await.unwrap();

        let sync = repo.sync(user_id, &ids(&[2])).await.unwrap();

        assert_eq!(sync.attached, ids(&[2]));
        assert_eq!(sync.detached, ids(&[1]));
        let roles = repo.roles_for_user(user_id).await.unwrap();
        assert_eq!(role_ids(&roles), ids(&[2]));
    }

    #[tokio::test]
    async fn test_sync_to_current_set_is_noop() {
        let repo = seeded(&["User", "Admin"]).await;
        let user_id = UserId::new(1);
        repo.attach(user_id, &ids(&[1, 2])).await.unwrap();

        let sync = repo.sync(user_id, &ids(&[2, 1])).await.unwrap();

        assert!(sync.is_noop());
        assert_eq!(repo.roles_for_user(user_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sync_only_touches_one_user() {
        let repo = seeded(&["User", "Admin"]).await;
        repo.attach(UserId::new(1), &ids(&[1])).await.unwrap();
        repo.attach(UserId::new(2), &ids(&[1])).await.unwrap();

        repo.sync(UserId::new(1), &[]).await.unwrap();

        assert!(repo.roles_for_user(UserId::new(1)).await.unwrap().is_empty());
        assert_eq!(repo.roles_for_user(UserId::new(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_detach_all_and_count_users() {
        let repo = seeded(&["User", "Admin"]).await;
        repo.attach(UserId::new(1), &ids(&[1, 2])).await.unwrap();
        repo.attach(UserId::new(2), &ids(&[1])).await.unwrap();

        assert_eq!(repo.count_users(RoleId::new(1)).await.unwrap(), 2);
        assert_eq!(repo.detach_all(UserId::new(1)).await.unwrap(), 2);
        assert_eq!(repo.count_users(RoleId::new(1)).await.unwrap(), 1);
        assert_eq!(repo.count_users(RoleId::new(2)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_role_removes_links() {
        let repo = seeded(&["User", "Admin"]).await;
        repo.attach(UserId::new(1), &ids(&[1, 2])).await.unwrap();

        assert!(repo.delete(RoleId::new(1)).await.unwrap());
        assert!(!repo.delete(RoleId::new(1)).await.unwrap());

        let roles = repo.roles_for_user(UserId::new(1)).await.unwrap();
        assert_eq!(role_ids(&roles), ids(&[2]));
    }

    #[tokio::test]
    async fn test_update_checks_uniqueness() {
        let repo = seeded(&["User", "Admin"]).await;
        let mut user_role = repo.get(RoleId::new(1)).await.unwrap().unwrap();

        user_role.rename("Admin").unwrap();
        assert!(repo.update(&user_role).await.is_err());

        user_role.rename("Member").unwrap();
        let updated = repo.update(&user_role).await.unwrap();
        assert_eq!(updated.slug(), "member");
    }
}

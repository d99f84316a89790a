//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::domain::user::{NewUser, User, UserId, UserRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct UserTable {
    users: BTreeMap<UserId, User>,
    /// Index for email -> user ID lookup
    email_index: HashMap<String, UserId>,
}

/// In-memory implementation of UserRepository
///
/// IDs are handed out from a counter starting at 1 and never reused.
#[derive(Debug)]
pub struct InMemoryUserRepository {
    table: RwLock<UserTable>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            table: RwLock::new(UserTable::default()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let table = self.table.read().await;
        Ok(table.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let table = self.table.read().await;

        Ok(table
            .email_index
            .get(email)
            .and_then(|id| table.users.get(id))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut table = self.table.write().await;

        if table.email_index.contains_key(&user.email) {
            return Err(DomainError::conflict(format!(
                "Email '{}' already exists",
                user.email
            )));
        }

        let id = UserId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let user = user.into_user(id);

        table.email_index.insert(user.email().to_string(), id);
        table.users.insert(id, user.clone());

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut table = self.table.write().await;
        let id = user.id();

        let old_email = match table.users.get(&id) {
            Some(existing) => existing.email().to_string(),
            None => return Err(DomainError::user_not_found(id)),
        };

        // If email changed, check uniqueness and update index
        if old_email != user.email() {
            if table.email_index.contains_key(user.email()) {
                return Err(DomainError::conflict(format!(
                    "Email '{}' already exists",
                    user.email()
                )));
            }

            table.email_index.remove(&old_email);
            table.email_index.insert(user.email().to_string(), id);
        }

        table.users.insert(id, user.clone());

        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        let mut table = self.table.write().await;

        if let Some(user) = table.users.remove(&id) {
            table.email_index.remove(user.email());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let table = self.table.read().await;
        Ok(table.users.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let table = self.table.read().await;
        Ok(table.users.len())
    }

    async fn record_login(&self, id: UserId) -> Result<(), DomainError> {
        let mut table = self.table.write().await;

        if let Some(user) = table.users.get_mut(&id) {
            user.record_login();
            Ok(())
        } else {
            Err(DomainError::user_not_found(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hashed_password".to_string(),
            first_name: None,
            last_name: None,
            activated: false,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.create(new_user("a@example.com")).await.unwrap();
        let second = repo.create(new_user("b@example.com")).await.unwrap();

        assert_eq!(first.id(), UserId::new(1));
        assert_eq!(second.id(), UserId::new(2));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let repo = InMemoryUserRepository::new();

        let first = repo.create(new_user("a@example.com")).await.unwrap();
        repo.delete(first.id()).await.unwrap();
        let second = repo.create(new_user("a@example.com")).await.unwrap();

        assert_eq!(second.id(), UserId::new(2));
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("jane@doe.com")).await.unwrap();

        let retrieved = repo.get(user.id()).await.unwrap();
        assert_eq!(retrieved, Some(user));
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("jane@doe.com")).await.unwrap();

        let retrieved = repo.get_by_email("jane@doe.com").await.unwrap();
        assert_eq!(retrieved.unwrap().id(), UserId::new(1));

        let not_found = repo.get_by_email("john@doe.com").await.unwrap();
        assert!(not_found.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("jane@doe.com")).await.unwrap();

        let result = repo.create(new_user("jane@doe.com")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_moves_email_index() {
        let repo = InMemoryUserRepository::new();
        let mut user = repo.create(new_user("jane@doe.com")).await.unwrap();

        user.set_email("jane@smith.com");
        repo.update(&user).await.unwrap();

        assert!(repo.get_by_email("jane@doe.com").await.unwrap().is_none());
        assert!(repo.get_by_email("jane@smith.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_email_conflict() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("jane@doe.com")).await.unwrap();
        let mut john = repo.create(new_user("john@doe.com")).await.unwrap();

        john.set_email("jane@doe.com");

        let result = repo.update(&john).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();
        let ghost = new_user("ghost@doe.com").into_user(UserId::new(9));

        let result = repo.update(&ghost).await;
        assert!(matches!(result, Err(DomainError::UserNotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("jane@doe.com")).await.unwrap();

        assert!(repo.delete(user.id()).await.unwrap());
        assert!(!repo.delete(user.id()).await.unwrap());

        assert!(repo.get(user.id()).await.unwrap().is_none());
        assert!(repo.get_by_email("jane@doe.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("b@example.com")).await.unwrap();
        repo.create(new_user("a@example.com")).await.unwrap();

        let emails: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .iter()
            .map(|u| u.email().to_string())
            .collect();

        assert_eq!(emails, vec!["b@example.com", "a@example.com"]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_record_login() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("jane@doe.com")).await.unwrap();

        repo.record_login(user.id()).await.unwrap();

        let after = repo.get(user.id()).await.unwrap().unwrap();
        assert!(after.last_login_at().is_some());

        assert!(repo.record_login(UserId::new(99)).await.is_err());
    }
}

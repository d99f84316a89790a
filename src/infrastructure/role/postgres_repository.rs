//! PostgreSQL role repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::role::{NewRole, Role, RoleId, RoleRepository, RoleSync};
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::storage::is_unique_violation;

/// PostgreSQL implementation of RoleRepository
///
/// Membership lives in `role_users`; attach and sync run inside a transaction.
#[derive(Debug, Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to start transaction: {}", e)))
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn get(&self, id: RoleId) -> Result<Option<Role>, DomainError> {
        let row = sqlx::query("SELECT id, name, slug, created_at, updated_at FROM roles WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get role: {}", e)))?;

        row.as_ref().map(row_to_role).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Role>, DomainError> {
        let row = sqlx::query("SELECT id, name, slug, created_at, updated_at FROM roles WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get role by slug: {}", e)))?;

        row.as_ref().map(row_to_role).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Role>, DomainError> {
        let row = sqlx::query("SELECT id, name, slug, created_at, updated_at FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get role by name: {}", e)))?;

        row.as_ref().map(row_to_role).transpose()
    }

    async fn create(&self, role: NewRole) -> Result<Role, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO roles (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug, created_at, updated_at
            "#,
        )
        .bind(role.name())
        .bind(role.slug())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("Role '{}' already exists", role.name()))
            } else {
                DomainError::storage(format!("Failed to create role: {}", e))
            }
        })?;

        row_to_role(&row)
    }

    async fn update(&self, role: &Role) -> Result<Role, DomainError> {
        let result = sqlx::query("UPDATE roles SET name = $2, slug = $3, updated_at = $4 WHERE id = $1")
            .bind(role.id().value())
            .bind(role.name())
            .bind(role.slug())
            .bind(role.updated_at())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::conflict(format!("Role '{}' already exists", role.name()))
                } else {
                    DomainError::storage(format!("Failed to update role: {}", e))
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Role '#{}' not found", role.id())));
        }

        Ok(role.clone())
    }

    async fn delete(&self, id: RoleId) -> Result<bool, DomainError> {
        // role_users rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete role: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Role>, DomainError> {
        let rows = sqlx::query("SELECT id, name, slug, created_at, updated_at FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list roles: {}", e)))?;

        rows.iter().map(row_to_role).collect()
    }

    async fn roles_for_user(&self, user_id: UserId) -> Result<Vec<Role>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.slug, r.created_at, r.updated_at
            FROM roles r
            JOIN role_users ru ON ru.role_id = r.id
            WHERE ru.user_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to load user roles: {}", e)))?;

        rows.iter().map(row_to_role).collect()
    }

    async fn attach(&self, user_id: UserId, roles: &[RoleId]) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        for role_id in roles {
            insert_link(&mut tx, user_id, *role_id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to attach roles: {}", e)))
    }

    async fn sync(&self, user_id: UserId, roles: &[RoleId]) -> Result<RoleSync, DomainError> {
        let mut tx = self.begin().await?;

        let current: Vec<i64> =
            sqlx::query_scalar("SELECT role_id FROM role_users WHERE user_id = $1 FOR UPDATE")
                .bind(user_id.value())
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to load user roles: {}", e)))?;

        let current: Vec<RoleId> = current.into_iter().map(RoleId::new).collect();
        let sync = RoleSync::between(&current, roles);

        if !sync.detached.is_empty() {
            let detached: Vec<i64> = sync.detached.iter().map(RoleId::value).collect();

            sqlx::query("DELETE FROM role_users WHERE user_id = $1 AND role_id = ANY($2)")
                .bind(user_id.value())
                .bind(&detached)
                .execute(&mut *tx)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to detach roles: {}", e)))?;
        }

        for role_id in &sync.attached {
            insert_link(&mut tx, user_id, *role_id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to sync roles: {}", e)))?;

        Ok(sync)
    }

    async fn detach_all(&self, user_id: UserId) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM role_users WHERE user_id = $1")
            .bind(user_id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to detach roles: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }

    async fn count_users(&self, id: RoleId) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role_users WHERE role_id = $1")
            .bind(id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count role users: {}", e)))?;

        Ok(count as usize)
    }
}

async fn insert_link(
    tx: &mut Transaction<'static, Postgres>,
    user_id: UserId,
    role_id: RoleId,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO role_users (user_id, role_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, role_id) DO NOTHING
        "#,
    )
    .bind(user_id.value())
    .bind(role_id.value())
    .execute(&mut **tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.constraint() == Some("role_users_role_id_fkey") => {
            DomainError::not_found(format!("Role '#{}' not found", role_id))
        }
        sqlx::Error::Database(db) if db.constraint() == Some("role_users_user_id_fkey") => {
            DomainError::user_not_found(user_id)
        }
        _ => DomainError::storage(format!("Failed to attach role: {}", e)),
    })?;

    Ok(())
}

fn row_to_role(row: &sqlx::postgres::PgRow) -> Result<Role, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Invalid role row: {}", e));

    let id: i64 = row.try_get("id").map_err(read)?;
    let name: String = row.try_get("name").map_err(read)?;
    let slug: String = row.try_get("slug").map_err(read)?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at").map_err(read)?;
    let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at").map_err(read)?;

    Ok(Role::restore(RoleId::new(id), name, slug, created_at, updated_at))
}

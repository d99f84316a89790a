//! Role entity and related types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{resolve_slug, RoleValidationError};

/// Role identifier, assigned by the store when the role is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(i64);

impl RoleId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for RoleId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a caller points at a role when assigning it to a user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleRef {
    Id(RoleId),
    /// Matched against the role name or its slug
    Name(String),
}

impl From<RoleId> for RoleRef {
    fn from(id: RoleId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for RoleRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for RoleRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl std::fmt::Display for RoleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{}", id),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Parses `#<id>` as an ID reference and anything else as a name or slug
impl std::str::FromStr for RoleRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.strip_prefix('#').and_then(|raw| raw.parse::<i64>().ok());

        Ok(match id {
            Some(id) => Self::Id(RoleId::new(id)),
            None => Self::Name(s.to_string()),
        })
    }
}

/// A validated role that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    name: String,
    slug: String,
}

impl NewRole {
    /// Build a role from a name and an optional caller-supplied slug
    pub fn new(name: &str, slug: Option<&str>) -> Result<Self, RoleValidationError> {
        let slug = resolve_slug(name, slug)?;

        Ok(Self {
            name: name.trim().to_string(),
            slug,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn into_role(self, id: RoleId) -> Role {
        let now = Utc::now();

        Role {
            id,
            name: self.name,
            slug: self.slug,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Named permission group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Role {
    /// Rebuild a role from persisted columns
    pub fn restore(
        id: RoleId,
        name: impl Into<String>,
        slug: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> RoleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Rename the role; the slug follows the name
    pub fn rename(&mut self, name: &str) -> Result<(), RoleValidationError> {
        let slug = resolve_slug(name, None)?;
        self.name = name.trim().to_string();
        self.slug = slug;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Outcome of replacing a user's role set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSync {
    /// Roles that were linked by the sync
    pub attached: Vec<RoleId>,
    /// Roles that were unlinked by the sync
    pub detached: Vec<RoleId>,
}

impl RoleSync {
    /// Set difference between the current and the desired role set.
    ///
    /// Roles present in both are left alone.
    pub fn between(current: &[RoleId], desired: &[RoleId]) -> Self {
        let current: BTreeSet<RoleId> = current.iter().copied().collect();
        let desired: BTreeSet<RoleId> = desired.iter().copied().collect();

        Self {
            attached: desired.difference(&current).copied().collect(),
            detached: current.difference(&desired).copied().collect(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<RoleId> {
        raw.iter().copied().map(RoleId::new).collect()
    }

    #[test]
    fn test_role_ref_parsing_mirrors_display() {
        let by_id: RoleRef = "#3".parse().unwrap();
        assert_eq!(by_id, RoleRef::Id(RoleId::new(3)));
        assert_eq!(by_id.to_string(), "#3");

        assert_eq!("admin".parse::<RoleRef>().unwrap(), RoleRef::Name("admin".into()));
        assert_eq!("#x".parse::<RoleRef>().unwrap(), RoleRef::Name("#x".into()));
    }

    #[test]
    fn test_new_role_derives_slug() {
        let role = NewRole::new(" Super Admin ", None).unwrap();
        assert_eq!(role.name(), "Super Admin");
        assert_eq!(role.slug(), "super-admin");
    }

    #[test]
    fn test_new_role_rejects_foreign_slug() {
        assert!(NewRole::new("User", Some("admin")).is_err());
        assert!(NewRole::new("User", Some("user")).is_ok());
    }

    #[test]
    fn test_role_rename_updates_slug() {
        let mut role = NewRole::new("User", None).unwrap().into_role(RoleId::new(1));

        role.rename("Power User").unwrap();
        assert_eq!(role.name(), "Power User");
        assert_eq!(role.slug(), "power-user");

        assert!(role.rename("").is_err());
        assert_eq!(role.slug(), "power-user");
    }

    #[test]
    fn test_role_sync_replaces_set() {
        let sync = RoleSync::between(&ids(&[1]), &ids(&[2]));
        assert_eq!(sync.attached, ids(&[2]));
        assert_eq!(sync.detached, ids(&[1]));
    }

    #[test]
    fn test_role_sync_keeps_overlap() {
        let sync = RoleSync::between(&ids(&[1, 2, 3]), &ids(&[2, 3, 4, 4]));
        assert_eq!(sync.attached, ids(&[4]));
        assert_eq!(sync.detached, ids(&[1]));
    }

    #[test]
    fn test_role_sync_noop() {
        assert!(RoleSync::between(&ids(&[1, 2]), &ids(&[2, 1])).is_noop());
        assert!(RoleSync::between(&[], &[]).is_noop());
    }
}

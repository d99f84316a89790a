//! Role domain
//!
//! Roles are named permission groups assigned to users. A role's slug is
//! always derived from its name.

mod entity;
mod repository;
mod validation;

pub use entity::{NewRole, Role, RoleId, RoleRef, RoleSync};
pub use repository::RoleRepository;
pub use validation::{
    is_valid_slug, resolve_slug, slugify, validate_role_name, RoleValidationError,
};

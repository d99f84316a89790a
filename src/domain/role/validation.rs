//! Role validation and slug derivation

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors that can occur during role validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoleValidationError {
    #[error("Role name cannot be empty")]
    EmptyName,

    #[error("Role name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Role name '{0}' does not produce a usable slug")]
    UnsluggableName(String),

    #[error("Slug '{slug}' does not match role name (expected '{expected}')")]
    SlugMismatch { slug: String, expected: String },
}

const MAX_ROLE_NAME_LENGTH: usize = 100;

static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid"));

/// Derive a slug from a name: lowercase ASCII alphanumerics, every run of
/// other characters collapsed into a single hyphen, no leading/trailing hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Check that a string is a well-formed slug
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_PATTERN.is_match(slug)
}

/// Validate a role name
pub fn validate_role_name(name: &str) -> Result<(), RoleValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(RoleValidationError::EmptyName);
    }

    if name.chars().count() > MAX_ROLE_NAME_LENGTH {
        return Err(RoleValidationError::NameTooLong(MAX_ROLE_NAME_LENGTH));
    }

    if !is_valid_slug(&slugify(name)) {
        return Err(RoleValidationError::UnsluggableName(name.to_string()));
    }

    Ok(())
}

/// Resolve the slug for a role name.
///
/// A supplied slug must be exactly the one derived from the name.
pub fn resolve_slug(name: &str, slug: Option<&str>) -> Result<String, RoleValidationError> {
    validate_role_name(name)?;
    let expected = slugify(name.trim());

    match slug {
        Some(slug) if slug != expected => Err(RoleValidationError::SlugMismatch {
            slug: slug.to_string(),
            expected,
        }),
        _ => Ok(expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("User"), "user");
        assert_eq!(slugify("Super Admin"), "super-admin");
        assert_eq!(slugify("  Content -- Editors! "), "content-editors");
        assert_eq!(slugify("Level 2 Support"), "level-2-support");
        assert_eq!(slugify("Café Staff"), "caf-staff");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_is_deterministic() {
        assert_eq!(slugify("Admin Team"), slugify("Admin Team"));
        assert!(is_valid_slug(&slugify("Admin Team")));
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("admin"));
        assert!(is_valid_slug("super-admin"));
        assert!(!is_valid_slug("Super-Admin"));
        assert!(!is_valid_slug("-admin"));
        assert!(!is_valid_slug("admin--team"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_validate_role_name() {
        assert!(validate_role_name("Admin").is_ok());
        assert_eq!(validate_role_name("  "), Err(RoleValidationError::EmptyName));
        assert_eq!(
            validate_role_name(&"a".repeat(101)),
            Err(RoleValidationError::NameTooLong(100))
        );
        assert_eq!(
            validate_role_name("???"),
            Err(RoleValidationError::UnsluggableName("???".to_string()))
        );
    }

    #[test]
    fn test_resolve_slug() {
        assert_eq!(resolve_slug("Super Admin", None), Ok("super-admin".to_string()));
        assert_eq!(
            resolve_slug("Super Admin", Some("super-admin")),
            Ok("super-admin".to_string())
        );
        assert_eq!(
            resolve_slug("Super Admin", Some("admin")),
            Err(RoleValidationError::SlugMismatch {
                slug: "admin".to_string(),
                expected: "super-admin".to_string(),
            })
        );
    }
}

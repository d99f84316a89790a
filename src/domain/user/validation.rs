//! User validation utilities

use thiserror::Error;
use validator::ValidateEmail;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Email is required")]
    EmptyEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Email '{0}' is not a valid address")]
    InvalidEmail(String),

    #[error("Password is required")]
    EmptyPassword,

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("{field} exceeds maximum length of {max} characters")]
    NameTooLong { field: &'static str, max: usize },
}

const MAX_EMAIL_LENGTH: usize = 254;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_NAME_LENGTH: usize = 100;

/// Trim and lowercase an email so lookups and uniqueness are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address and return its normalized form
pub fn validate_email(email: &str) -> Result<String, UserValidationError> {
    let normalized = normalize_email(email);

    if normalized.is_empty() {
        return Err(UserValidationError::EmptyEmail);
    }

    if normalized.len() > MAX_EMAIL_LENGTH {
        return Err(UserValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    if !normalized.validate_email() {
        return Err(UserValidationError::InvalidEmail(normalized));
    }

    Ok(normalized)
}

/// Validate a password
///
/// Rules:
/// - Required
/// - Minimum 8 characters
/// - Maximum 128 characters
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.is_empty() {
        return Err(UserValidationError::EmptyPassword);
    }

    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Validate an optional first/last name, returning the trimmed value.
///
/// Blank names are stored as `None`.
pub fn validate_name(
    field: &'static str,
    name: Option<&str>,
) -> Result<Option<String>, UserValidationError> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(UserValidationError::NameTooLong {
            field,
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(Some(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert_eq!(
            validate_email("n.widart@gmail.com"),
            Ok("n.widart@gmail.com".to_string())
        );
        assert_eq!(
            validate_email("  Jane@Doe.COM "),
            Ok("jane@doe.com".to_string())
        );
    }

    #[test]
    fn test_empty_email() {
        assert_eq!(validate_email(""), Err(UserValidationError::EmptyEmail));
        assert_eq!(validate_email("   "), Err(UserValidationError::EmptyEmail));
    }

    #[test]
    fn test_invalid_email() {
        assert_eq!(
            validate_email("not-an-email"),
            Err(UserValidationError::InvalidEmail("not-an-email".to_string()))
        );
    }

    #[test]
    fn test_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            validate_email(&email),
            Err(UserValidationError::EmailTooLong(254))
        );
    }

    #[test]
    fn test_valid_passwords() {
        assert!(validate_password("demo1234").is_ok());
        assert!(validate_password("P@ssw0rd!").is_ok());
    }

    #[test]
    fn test_empty_password() {
        assert_eq!(
            validate_password(""),
            Err(UserValidationError::EmptyPassword)
        );
    }

    #[test]
    fn test_password_too_short() {
        assert_eq!(
            validate_password("1234567"),
            Err(UserValidationError::PasswordTooShort(8))
        );
    }

    #[test]
    fn test_password_too_long() {
        let long_password = "a".repeat(129);
        assert_eq!(
            validate_password(&long_password),
            Err(UserValidationError::PasswordTooLong(128))
        );
    }

    #[test]
    fn test_names() {
        assert_eq!(validate_name("first_name", None), Ok(None));
        assert_eq!(validate_name("first_name", Some("  ")), Ok(None));
        assert_eq!(
            validate_name("first_name", Some(" John ")),
            Ok(Some("John".to_string()))
        );

        let long_name = "a".repeat(101);
        assert_eq!(
            validate_name("last_name", Some(&long_name)),
            Err(UserValidationError::NameTooLong {
                field: "last_name",
                max: 100
            })
        );
    }
}

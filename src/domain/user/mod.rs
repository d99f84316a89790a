//! User domain
//!
//! This module provides domain types and traits for user records,
//! including the entity, validation rules, and the storage trait.

mod entity;
mod repository;
mod validation;

pub use entity::{NewUser, User, UserId};
pub use repository::UserRepository;
pub use validation::{
    normalize_email, validate_email, validate_name, validate_password, UserValidationError,
};

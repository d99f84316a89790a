//! API Key infrastructure implementations
//!
//! This module provides key generation and the in-memory and PostgreSQL
//! key stores.

mod generator;
mod postgres_repository;
mod repository;

pub use generator::{ApiKeyGenerator, GeneratedApiKey};
pub use postgres_repository::PostgresApiKeyRepository;
pub use repository::InMemoryApiKeyRepository;

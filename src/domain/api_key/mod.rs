//! API Key domain module
//!
//! API keys belong to users. One key is issued whenever a user is created.

mod entity;
mod repository;

pub use entity::{ApiKey, ApiKeyId, IssuedApiKey, NewApiKey};
pub use repository::ApiKeyRepository;

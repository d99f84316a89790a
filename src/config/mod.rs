//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, Argon2Settings, LogFormat, LoggingConfig, PostgresSettings, SecurityConfig,
    StorageBackend, StorageSettings,
};

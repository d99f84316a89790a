//! Domain layer - Core business logic and entities

pub mod api_key;
pub mod error;
pub mod event;
pub mod role;
pub mod user;

pub use api_key::{ApiKey, ApiKeyId, ApiKeyRepository, IssuedApiKey, NewApiKey};
pub use error::DomainError;
pub use event::{EventDispatcher, UserEvent, UserEventKind};
pub use role::{NewRole, Role, RoleId, RoleRef, RoleRepository, RoleSync};
pub use user::{NewUser, User, UserId, UserRepository};

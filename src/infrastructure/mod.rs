//! Infrastructure layer - Store, hashing and event implementations

pub mod api_key;
pub mod event;
pub mod logging;
pub mod role;
pub mod storage;
pub mod user;

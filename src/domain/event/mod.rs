//! Lifecycle events published by the user service

mod dispatcher;
mod entity;

pub use dispatcher::EventDispatcher;
pub use entity::{UserEvent, UserEventKind};

#[cfg(test)]
pub use dispatcher::MockEventDispatcher;

//! Event dispatcher trait

use async_trait::async_trait;

use super::entity::UserEvent;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Publishes lifecycle events to whoever is listening
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    /// Publish an event; having no subscribers is not an error
    async fn dispatch(&self, event: UserEvent) -> Result<(), DomainError>;
}

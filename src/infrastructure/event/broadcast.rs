//! Event dispatcher backed by a tokio broadcast channel

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::event::{EventDispatcher, UserEvent};
use crate::domain::DomainError;

const DEFAULT_CAPACITY: usize = 256;

/// Fans every event out to all current subscribers.
///
/// Subscribers that fall more than `capacity` events behind miss the oldest
/// ones (they observe `RecvError::Lagged`).
#[derive(Debug, Clone)]
pub struct BroadcastEventDispatcher {
    sender: broadcast::Sender<UserEvent>,
}

impl BroadcastEventDispatcher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Start receiving events dispatched from now on
    pub fn subscribe(&self) -> broadcast::Receiver<UserEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventDispatcher for BroadcastEventDispatcher {
    async fn dispatch(&self, event: UserEvent) -> Result<(), DomainError> {
        let kind = event.kind();
        let user_id = event.user_id();

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(event = %kind, user_id = %user_id, receivers, "Dispatched user event");
            }
            Err(_) => {
                debug!(event = %kind, user_id = %user_id, "No subscribers for user event");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::UserEventKind;
    use crate::domain::user::{NewUser, User, UserId};

    fn test_user(id: i64) -> User {
        NewUser {
            email: format!("user{}@example.com", id),
            password_hash: "hash".to_string(),
            first_name: None,
            last_name: None,
            activated: false,
        }
        .into_user(UserId::new(id))
    }

    #[tokio::test]
    async fn test_dispatch_without_subscribers() {
        let dispatcher = BroadcastEventDispatcher::new();

        assert_eq!(dispatcher.subscriber_count(), 0);
        assert!(dispatcher
            .dispatch(UserEvent::UserWasCreated(test_user(1)))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_events_in_order() {
        let dispatcher = BroadcastEventDispatcher::new();
        let mut first = dispatcher.subscribe();
        let mut second = dispatcher.subscribe();

        dispatcher
            .dispatch(UserEvent::UserIsUpdating(test_user(1)))
            .await
            .unwrap();
        dispatcher
            .dispatch(UserEvent::UserWasUpdated(test_user(1)))
            .await
            .unwrap();

        for receiver in [&mut first, &mut second] {
            assert_eq!(receiver.recv().await.unwrap().kind(), UserEventKind::UserIsUpdating);
            assert_eq!(receiver.recv().await.unwrap().kind(), UserEventKind::UserWasUpdated);
        }
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let dispatcher = BroadcastEventDispatcher::new();
        let _early = dispatcher.subscribe();

        dispatcher
            .dispatch(UserEvent::UserWasCreated(test_user(1)))
            .await
            .unwrap();

        let mut late = dispatcher.subscribe();
        dispatcher
            .dispatch(UserEvent::UserWasCreated(test_user(2)))
            .await
            .unwrap();

        assert_eq!(late.recv().await.unwrap().user_id(), UserId::new(2));
    }
}

//! Event dispatcher that keeps every event it receives

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::event::{EventDispatcher, UserEvent, UserEventKind};
use crate::domain::DomainError;

/// Records dispatched events in order so callers can assert on them
#[derive(Debug, Default)]
pub struct RecordingEventDispatcher {
    events: Mutex<Vec<UserEvent>>,
}

impl RecordingEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in dispatch order
    pub async fn events(&self) -> Vec<UserEvent> {
        self.events.lock().await.clone()
    }

    /// Kinds of all events in dispatch order
    pub async fn kinds(&self) -> Vec<UserEventKind> {
        self.events.lock().await.iter().map(UserEvent::kind).collect()
    }

    /// Events of one kind
    pub async fn dispatched(&self, kind: UserEventKind) -> Vec<UserEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }

    /// True if an event of `kind` matching `predicate` was dispatched
    pub async fn has_dispatched<F>(&self, kind: UserEventKind, predicate: F) -> bool
    where
        F: Fn(&UserEvent) -> bool,
    {
        self.events
            .lock()
            .await
            .iter()
            .any(|e| e.kind() == kind && predicate(e))
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

#[async_trait]
impl EventDispatcher for RecordingEventDispatcher {
    async fn dispatch(&self, event: UserEvent) -> Result<(), DomainError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{NewUser, UserId};

    fn event(id: i64) -> UserEvent {
        UserEvent::UserWasCreated(
            NewUser {
                email: format!("user{}@example.com", id),
                password_hash: "hash".to_string(),
                first_name: None,
                last_name: None,
                activated: false,
            }
            .into_user(UserId::new(id)),
        )
    }

    #[tokio::test]
    async fn test_records_in_order() {
        let recorder = RecordingEventDispatcher::new();

        recorder.dispatch(event(1)).await.unwrap();
        recorder.dispatch(event(2)).await.unwrap();

        let ids: Vec<UserId> = recorder.events().await.iter().map(UserEvent::user_id).collect();
        assert_eq!(ids, vec![UserId::new(1), UserId::new(2)]);
        assert_eq!(recorder.dispatched(UserEventKind::UserWasCreated).await.len(), 2);
        assert!(recorder.dispatched(UserEventKind::UserWasUpdated).await.is_empty());
    }

    #[tokio::test]
    async fn test_has_dispatched_and_clear() {
        let recorder = RecordingEventDispatcher::new();
        recorder.dispatch(event(3)).await.unwrap();

        assert!(
            recorder
                .has_dispatched(UserEventKind::UserWasCreated, |e| e.user_id() == UserId::new(3))
                .await
        );
        assert!(
            !recorder
                .has_dispatched(UserEventKind::UserWasCreated, |e| e.user_id() == UserId::new(4))
                .await
        );

        recorder.clear().await;
        assert!(recorder.kinds().await.is_empty());
    }
}

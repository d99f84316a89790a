//! User lifecycle events

use serde::{Deserialize, Serialize};

use crate::domain::user::{User, UserId};

/// Kinds of lifecycle events emitted around user mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserEventKind {
    /// A user was created through the standard path
    UserWasCreated,
    /// A user was created through self-registration
    UserHasRegistered,
    /// A user is about to be updated
    UserIsUpdating,
    /// A user update was persisted
    UserWasUpdated,
}

impl UserEventKind {
    /// Returns all event kinds
    pub fn all() -> Vec<Self> {
        vec![
            Self::UserWasCreated,
            Self::UserHasRegistered,
            Self::UserIsUpdating,
            Self::UserWasUpdated,
        ]
    }

    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserWasCreated => "user_was_created",
            Self::UserHasRegistered => "user_has_registered",
            Self::UserIsUpdating => "user_is_updating",
            Self::UserWasUpdated => "user_was_updated",
        }
    }
}

impl std::fmt::Display for UserEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lifecycle event with a snapshot of the affected user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "user", rename_all = "snake_case")]
pub enum UserEvent {
    UserWasCreated(User),
    UserHasRegistered(User),
    /// Carries the user as it was before the update
    UserIsUpdating(User),
    /// Carries the user as persisted by the update
    UserWasUpdated(User),
}

impl UserEvent {
    pub fn kind(&self) -> UserEventKind {
        match self {
            Self::UserWasCreated(_) => UserEventKind::UserWasCreated,
            Self::UserHasRegistered(_) => UserEventKind::UserHasRegistered,
            Self::UserIsUpdating(_) => UserEventKind::UserIsUpdating,
            Self::UserWasUpdated(_) => UserEventKind::UserWasUpdated,
        }
    }

    pub fn user(&self) -> &User {
        match self {
            Self::UserWasCreated(user)
            | Self::UserHasRegistered(user)
            | Self::UserIsUpdating(user)
            | Self::UserWasUpdated(user) => user,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user().id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::NewUser;

    fn test_user() -> User {
        NewUser {
            email: "jane@doe.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: None,
            last_name: None,
            activated: true,
        }
        .into_user(UserId::new(5))
    }

    #[test]
    fn test_event_kind_names() {
        let names: Vec<&str> = UserEventKind::all().iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "user_was_created",
                "user_has_registered",
                "user_is_updating",
                "user_was_updated"
            ]
        );
    }

    #[test]
    fn test_event_accessors() {
        let event = UserEvent::UserIsUpdating(test_user());

        assert_eq!(event.kind(), UserEventKind::UserIsUpdating);
        assert_eq!(event.user_id(), UserId::new(5));
        assert_eq!(event.user().email(), "jane@doe.com");
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(UserEvent::UserWasCreated(test_user())).unwrap();

        assert_eq!(json["event"], "user_was_created");
        assert_eq!(json["user"]["id"], 5);
        assert!(json["user"].get("password_hash").is_none());
    }
}

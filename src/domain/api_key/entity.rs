//! API Key entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;

/// API Key identifier, assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(i64);

impl ApiKeyId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An API key ready to be stored for a user
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub user_id: UserId,
    pub key_prefix: String,
    pub key_hash: String,
}

impl NewApiKey {
    pub fn into_api_key(self, id: ApiKeyId) -> ApiKey {
        ApiKey {
            id,
            user_id: self.user_id,
            key_prefix: self.key_prefix,
            key_hash: self.key_hash,
            created_at: Utc::now(),
            last_used_at: None,
        }
    }
}

/// API Key entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    id: ApiKeyId,
    /// Owner of the key
    user_id: UserId,
    /// Key prefix for identification (type prefix + first 8 random chars)
    key_prefix: String,
    /// SHA-256 of the full key, never exposed in serialization
    #[serde(skip_serializing, default)]
    key_hash: String,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_used_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Rebuild a key from persisted columns
    pub fn restore(
        id: ApiKeyId,
        user_id: UserId,
        key_prefix: impl Into<String>,
        key_hash: impl Into<String>,
        created_at: DateTime<Utc>,
        last_used_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            user_id,
            key_prefix: key_prefix.into(),
            key_hash: key_hash.into(),
            created_at,
            last_used_at,
        }
    }

    pub fn id(&self) -> ApiKeyId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn key_hash(&self) -> &str {
        &self.key_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    /// Record usage of this key
    pub fn record_usage(&mut self) {
        self.last_used_at = Some(Utc::now());
    }
}

/// A freshly issued key; the plaintext is only available here
#[derive(Debug, Clone)]
pub struct IssuedApiKey {
    pub api_key: ApiKey,
    /// The full key, shown once
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_key() -> ApiKey {
        NewApiKey {
            user_id: UserId::new(1),
            key_prefix: "uk_live_abcdefgh".to_string(),
            key_hash: "sha256$secret".to_string(),
        }
        .into_api_key(ApiKeyId::new(10))
    }

    #[test]
    fn test_api_key_creation() {
        let key = create_test_key();

        assert_eq!(key.id(), ApiKeyId::new(10));
        assert_eq!(key.user_id(), UserId::new(1));
        assert_eq!(key.key_prefix(), "uk_live_abcdefgh");
        assert!(key.last_used_at().is_none());
    }

    #[test]
    fn test_api_key_record_usage() {
        let mut key = create_test_key();
        key.record_usage();
        assert!(key.last_used_at().is_some());
    }

    #[test]
    fn test_serialization_excludes_hash() {
        let json = serde_json::to_string(&create_test_key()).unwrap();
        assert!(!json.contains("sha256$secret"));
        assert!(!json.contains("key_hash"));
        assert!(json.contains("uk_live_abcdefgh"));
    }
}

//! API Key generation
//!
//! Generates random API keys and the hash stored in their place.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random characters kept in the stored, non-secret prefix
const PREFIX_RANDOM_CHARS: usize = 8;

/// Result of generating a new API key
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// The full API key (only shown once at creation)
    pub key: String,
    /// The key prefix for identification
    pub prefix: String,
    /// The hashed key for storage
    pub hash: String,
}

/// Generator for user API keys
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    /// Prefix for all generated keys (e.g. "uk_live_")
    prefix: String,
    /// Number of random bytes to generate
    key_bytes: usize,
}

impl ApiKeyGenerator {
    /// Create a new API key generator
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            key_bytes: 32,
        }
    }

    /// Set the number of random bytes
    pub fn with_key_bytes(mut self, bytes: usize) -> Self {
        self.key_bytes = bytes;
        self
    }

    /// Generate a new API key
    pub fn generate(&self) -> GeneratedApiKey {
        let mut random_bytes = vec![0u8; self.key_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        let encoded = URL_SAFE_NO_PAD.encode(&random_bytes);
        let key = format!("{}{}", self.prefix, encoded);

        let unique_prefix = format!(
            "{}{}",
            self.prefix,
            &encoded[..PREFIX_RANDOM_CHARS.min(encoded.len())]
        );

        let hash = self.hash_key(&key);

        GeneratedApiKey {
            key,
            prefix: unique_prefix,
            hash,
        }
    }

    /// Hash an API key for storage
    pub fn hash_key(&self, key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let result = hasher.finalize();
        format!("sha256${}", URL_SAFE_NO_PAD.encode(result))
    }

    /// Verify an API key against a stored hash
    pub fn verify_key(&self, key: &str, stored_hash: &str) -> bool {
        let computed_hash = self.hash_key(key);
        constant_time_compare(&computed_hash, stored_hash)
    }

    /// The stored prefix of a presented key, or `None` if the key was not
    /// produced by a generator with this prefix
    pub fn prefix_of<'a>(&self, key: &'a str) -> Option<&'a str> {
        let end = self.prefix.len() + PREFIX_RANDOM_CHARS;

        if !key.starts_with(&self.prefix) || key.len() < end || !key.is_char_boundary(end) {
            return None;
        }

        Some(&key[..end])
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::new("uk_live_")
    }
}

//! API Key generation
//!
//! Generates high-entropy secrets with a recognizable prefix. Uniqueness comes
//! from the size of the random space, not from a collision check.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

/// Default prefix marking a string as one of our API keys
pub const DEFAULT_KEY_PREFIX: &str = "rsg_";

/// Default number of random bytes (256 bits)
pub const DEFAULT_KEY_BYTES: usize = 32;

/// Generator for API key secrets
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    /// Prefix for all generated keys
    prefix: String,
    /// Number of random bytes to generate
    key_bytes: usize,
}

impl ApiKeyGenerator {
    /// Create a new API key generator
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            key_bytes: DEFAULT_KEY_BYTES,
        }
    }

    /// Set the number of random bytes
    pub fn with_key_bytes(mut self, bytes: usize) -> Self {
        self.key_bytes = bytes;
        self
    }

    /// Generate a new secret
    pub fn generate(&self) -> String {
        let mut random_bytes = vec![0u8; self.key_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        format!("{}{}", self.prefix, URL_SAFE_NO_PAD.encode(&random_bytes))
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_key() {
        let generator = ApiKeyGenerator::default();
        let secret = generator.generate();

        assert!(secret.starts_with("rsg_"));
    }

    #[test]
    fn test_generate_custom_prefix() {
        let generator = ApiKeyGenerator::new("sk-");
        let secret = generator.generate();

        assert!(secret.starts_with("sk-"));
        assert!(!secret.starts_with(DEFAULT_KEY_PREFIX));
    }

    #[test]
    fn test_key_uniqueness() {
        let generator = ApiKeyGenerator::default();
        let secrets: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();

        assert_eq!(secrets.len(), 1000);
    }

    #[test]
    fn test_key_length() {
        let generator = ApiKeyGenerator::default();
        let secret = generator.generate();

        // 32 bytes base64-encoded = 43 chars, plus prefix
        assert_eq!(secret.len(), "rsg_".len() + 43);
    }

    #[test]
    fn test_custom_key_bytes() {
        let generator = ApiKeyGenerator::default().with_key_bytes(64);
        let secret = generator.generate();

        // 64 bytes base64-encoded = 86 chars, plus prefix
        assert_eq!(secret.len(), "rsg_".len() + 86);
    }

    #[test]
    fn test_secret_is_url_safe() {
        let secret = ApiKeyGenerator::default().generate();
        assert!(secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}

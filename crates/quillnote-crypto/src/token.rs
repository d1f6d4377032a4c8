//! Opaque bearer session tokens.
//!
//! Tokens are `qn_at_<48 random alphanumeric chars>`; only the SHA-256 hex
//! of the full token is stored, so a database leak does not leak sessions.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Prefix identifying quillnote access tokens.
pub const TOKEN_PREFIX: &str = "qn_at_";

/// Random secret length for generated tokens.
pub const TOKEN_SECRET_LEN: usize = 48;

/// Generate a cryptographically secure random string.
fn generate_secret(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Generate a fresh session token.
pub fn generate_token() -> String {
    format!("{}{}", TOKEN_PREFIX, generate_secret(TOKEN_SECRET_LEN))
}

/// Hash a token for at-rest storage using SHA-256.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether a presented bearer token has the expected shape.
pub fn looks_like_token(token: &str) -> bool {
    token.len() == TOKEN_PREFIX.len() + TOKEN_SECRET_LEN
        && token.starts_with(TOKEN_PREFIX)
        && token[TOKEN_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let token = generate_token();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(token.len(), TOKEN_PREFIX.len() + TOKEN_SECRET_LEN);
        assert!(looks_like_token(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_stable_hex_sha256() {
        let h1 = hash_token("qn_at_example");
        let h2 = hash_token("qn_at_example");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_tokens_hash_differently() {
        assert_ne!(hash_token(&generate_token()), hash_token(&generate_token()));
    }

    #[test]
    fn test_looks_like_token_rejects_malformed() {
        assert!(!looks_like_token("qn_at_short"));
        assert!(!looks_like_token("Bearer abc"));
        assert!(!looks_like_token(&format!(
            "xx_at_{}",
            "a".repeat(TOKEN_SECRET_LEN)
        )));
        assert!(!looks_like_token(&format!(
            "qn_at_{}!",
            "a".repeat(TOKEN_SECRET_LEN - 1)
        )));
    }
}

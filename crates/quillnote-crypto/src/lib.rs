//! # quillnote-crypto
//!
//! Credential primitives for quillnote: Argon2id hashing for user passwords
//! and note PINs, and opaque bearer session tokens hashed for at-rest
//! storage. These are used, not reimplemented — all primitives come from the
//! RustCrypto crates.

pub mod error;
pub mod password;
pub mod token;

pub use error::{CryptoError, CryptoResult};
pub use password::{hash_password, hash_pin, hash_secret, verify_secret, HashParams};
pub use token::{generate_token, hash_token, looks_like_token, TOKEN_PREFIX, TOKEN_SECRET_LEN};

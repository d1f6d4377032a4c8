//! Centralized default constants for the quillnote system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// ENRICHMENT
// =============================================================================

/// Default base URL for the Groq OpenAI-compatible API.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default generation model for summaries, titles, and tags.
pub const GEN_MODEL: &str = "llama-3.1-8b-instant";

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// AUTH
// =============================================================================

/// Session token lifetime in hours (30 days).
pub const SESSION_TTL_HOURS: i64 = 720;

// =============================================================================
// API
// =============================================================================

/// Default HTTP listen port.
pub const PORT: u16 = 3000;

/// Maximum request body size in bytes (covers multipart uploads).
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

// =============================================================================
// BLOBS
// =============================================================================

/// Default filesystem path for blob storage.
pub const BLOB_STORAGE_PATH: &str = "/var/quillnote/blobs";

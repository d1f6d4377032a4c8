//! # quillnote-core
//!
//! Core types, traits, and abstractions for quillnote.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other quillnote crates depend on: the domain models, the error type,
//! the pin-lock state machine, the repository/backend seams, and the
//! client-mirrored edit-buffer model.

pub mod defaults;
pub mod edit_buffer;
pub mod error;
pub mod lock;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use edit_buffer::{EditBuffer, EditorSession, SearchDebounce};
pub use error::{Error, Result};
pub use lock::LockState;
pub use models::*;
pub use traits::*;

/// Generate a new UUIDv7 identifier.
///
/// UUIDv7 embeds a Unix timestamp (milliseconds) in the first 48 bits,
/// so ids sort chronologically.
#[inline]
pub fn new_v7() -> uuid::Uuid {
    uuid::Uuid::now_v7()
}

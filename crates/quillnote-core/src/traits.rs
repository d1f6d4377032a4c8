//! Core traits for quillnote abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// USER & SESSION REPOSITORIES
// =============================================================================

/// Fields for inserting a new user. The hash is produced by quillnote-crypto.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Repository for user identity.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails on duplicate email.
    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Fetch a user by (lowercased) email, or None.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Fetch a user by id, or None.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

/// Repository for opaque bearer sessions. Only token hashes are stored.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session for `user_id`.
    async fn insert(&self, user_id: Uuid, token_hash: &str, expires_at: DateTime<Utc>)
        -> Result<Session>;

    /// Look up an unexpired session by token hash, or None.
    async fn find_valid(&self, token_hash: &str) -> Result<Option<Session>>;

    /// Revoke the session with the given token hash (logout).
    async fn revoke(&self, token_hash: &str) -> Result<()>;

    /// Delete all expired sessions; returns the number removed.
    async fn purge_expired(&self) -> Result<u64>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Fully-resolved fields for inserting a note (enrichment already applied).
#[derive(Debug, Clone)]
pub struct NewNote {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
}

/// Resolved field changes for an update. `None` fields are untouched.
///
/// The lifecycle layer resolves enrichment before building this, so the
/// repository applies exactly what it is given: summary/tags are only
/// present when content changed.
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Repository for note persistence. All owner-scoped methods treat a
/// missing-or-unowned note as `Error::NoteNotFound`.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note and return it.
    async fn insert(&self, note: NewNote) -> Result<Note>;

    /// Fetch a note owned by `user_id`.
    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Note>;

    /// Fetch a note by id regardless of owner (public share path).
    async fn fetch_any(&self, id: Uuid) -> Result<Note>;

    /// List notes owned by the caller, pinned-first then newest-first,
    /// optionally filtered by case-insensitive substring search.
    async fn list(&self, req: ListNotesRequest) -> Result<Vec<Note>>;

    /// Apply resolved field changes and return the updated note.
    async fn update(&self, user_id: Uuid, id: Uuid, changes: NoteChanges) -> Result<Note>;

    /// Hard-delete a note owned by `user_id`.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;

    /// Flip `is_pinned` and return the updated note.
    async fn toggle_pin(&self, user_id: Uuid, id: Uuid) -> Result<Note>;

    /// Persist a lock transition: `pin_hash` present iff locking.
    async fn set_lock(&self, user_id: Uuid, id: Uuid, pin_hash: Option<String>) -> Result<Note>;

    /// Append an attachment record and return the updated note.
    async fn append_file(&self, user_id: Uuid, id: Uuid, file: NoteFile) -> Result<Note>;
}

// =============================================================================
// ENRICHMENT BACKEND
// =============================================================================

/// Narrow capability interface over the language-model API.
///
/// Deliberately three text-in/text-out operations so tests can substitute
/// deterministic fakes. Calls are synchronous per request; failures surface
/// as `Error::Enrichment`.
#[async_trait]
pub trait EnrichmentBackend: Send + Sync {
    /// Produce a 2-3 line summary of the content.
    async fn summarize(&self, content: &str) -> Result<String>;

    /// Produce one short title for the content.
    async fn title(&self, content: &str) -> Result<String>;

    /// Produce 3-5 relevant tags for the content.
    async fn tags(&self, content: &str) -> Result<Vec<String>>;
}

// =============================================================================
// BLOB BACKEND
// =============================================================================

/// Narrow capability interface over the blob store.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Store `data` durably; returns the public URL and storage id.
    async fn store(&self, data: &[u8], original_name: &str, content_type: &str)
        -> Result<StoredBlob>;

    /// Read back a stored blob by storage id.
    async fn read(&self, storage_id: &str) -> Result<Vec<u8>>;

    /// Delete a stored blob by storage id.
    async fn delete(&self, storage_id: &str) -> Result<()>;
}

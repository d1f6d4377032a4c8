//! Core data models for quillnote.
//!
//! These types are shared across all quillnote crates and represent
//! the core domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lock::LockState;

// =============================================================================
// USER & SESSION TYPES
// =============================================================================

/// A registered user.
///
/// The password hash never leaves the db/crypto layers; API responses use
/// [`UserView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Unique, stored lowercased.
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub created_at_utc: DateTime<Utc>,
}

/// Public projection of a user (no credentials).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at_utc: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            created_at_utc: u.created_at_utc,
        }
    }
}

/// An opaque bearer session.
///
/// Only the SHA-256 hex of the token is stored; the raw `qn_at_...` token is
/// returned to the client once at login.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A file attached to a note via the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFile {
    /// Durable public URL of the stored blob.
    pub url: String,
    /// Backend identifier, used for retrieval/deletion.
    pub storage_id: String,
    pub original_name: String,
    pub content_type: String,
}

/// A user-owned note with AI-derived metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    /// Owner. Immutable after creation.
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    /// AI-derived from content; regenerated only when content changes.
    pub summary: String,
    /// AI-derived from content; regenerated only when content changes.
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_locked: bool,
    /// Argon2id PHC string of the note PIN. Present iff `is_locked`.
    #[serde(skip_serializing)]
    pub pin_hash: Option<String>,
    pub files: Vec<NoteFile>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

impl Note {
    /// Current lock state as a value the state machine can operate on.
    pub fn lock_state(&self) -> LockState {
        match &self.pin_hash {
            Some(hash) => LockState::Locked {
                pin_hash: hash.clone(),
            },
            None => LockState::Unlocked,
        }
    }

    /// Check the `is_locked ⟺ pin_hash present` invariant.
    pub fn lock_invariant_holds(&self) -> bool {
        self.is_locked == self.pin_hash.is_some()
    }
}

/// Public read-only projection served by the share endpoint.
///
/// Excludes lock fields, attachments, and the owner id. Served for any note
/// id regardless of owner or lock state (anyone-with-the-link semantics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedNoteView {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub created_at_utc: DateTime<Utc>,
}

impl From<Note> for SharedNoteView {
    fn from(n: Note) -> Self {
        Self {
            title: n.title,
            content: n.content,
            summary: n.summary,
            tags: n.tags,
            created_at_utc: n.created_at_utc,
        }
    }
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request for registering a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request for logging in.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

/// Request for creating a note.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNoteRequest {
    /// Optional explicit title; when absent or blank the title is generated.
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
}

/// Request for updating a note. Absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Request carrying a note PIN (lock, verify-pin, unlock).
#[derive(Debug, Clone, Deserialize)]
pub struct PinRequest {
    pub pin: String,
}

/// Owner-scoped note listing parameters.
#[derive(Debug, Clone, Default)]
pub struct ListNotesRequest {
    pub user_id: Uuid,
    /// Case-insensitive substring match against title OR content.
    pub search: Option<String>,
}

/// A blob stored by a [`crate::traits::BlobBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlob {
    pub url: String,
    pub storage_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        Note {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            title: "Groceries".to_string(),
            content: "Buy milk".to_string(),
            summary: "A shopping reminder.".to_string(),
            tags: vec!["shopping".to_string(), "errands".to_string()],
            is_pinned: false,
            is_locked: false,
            pin_hash: None,
            files: Vec::new(),
            created_at_utc: Utc::now(),
            updated_at_utc: Utc::now(),
        }
    }

    #[test]
    fn test_pin_hash_never_serialized() {
        let mut note = sample_note();
        note.is_locked = true;
        note.pin_hash = Some("$argon2id$v=19$secret".to_string());

        let json = serde_json::to_value(&note).unwrap();
        assert!(json.get("pin_hash").is_none());
        assert_eq!(json["is_locked"], true);
    }

    #[test]
    fn test_lock_invariant_detects_drift() {
        let mut note = sample_note();
        assert!(note.lock_invariant_holds());

        note.is_locked = true;
        assert!(!note.lock_invariant_holds());

        note.pin_hash = Some("hash".to_string());
        assert!(note.lock_invariant_holds());
    }

    #[test]
    fn test_shared_view_projects_public_fields_only() {
        let mut note = sample_note();
        note.is_locked = true;
        note.pin_hash = Some("hash".to_string());
        note.files.push(NoteFile {
            url: "http://localhost/files/x".to_string(),
            storage_id: "x".to_string(),
            original_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
        });

        let view = SharedNoteView::from(note.clone());
        assert_eq!(view.title, note.title);
        assert_eq!(view.content, note.content);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("is_locked").is_none());
        assert!(json.get("files").is_none());
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_update_request_absent_fields_deserialize_as_none() {
        let req: UpdateNoteRequest = serde_json::from_str(r#"{"title":"New title"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("New title"));
        assert!(req.content.is_none());
    }

    #[test]
    fn test_user_view_drops_password_hash() {
        let user = User {
            id: Uuid::now_v7(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            created_at_utc: Utc::now(),
        };
        let view: UserView = user.into();
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
    }
}

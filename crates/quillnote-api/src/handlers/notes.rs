//! Note lifecycle handlers: CRUD, pin, lock, attachments, and public share.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use quillnote_core::{
    BlobBackend, CreateNoteRequest, EnrichmentBackend, Error, ListNotesRequest, NewNote, Note,
    NoteChanges, NoteFile, NoteRepository, PinRequest, SharedNoteView, UpdateNoteRequest,
};

use crate::auth::Auth;
use crate::{ApiError, AppState};

// =============================================================================
// ENRICHMENT POLICY
// =============================================================================

/// Resolve a create request into fully-enriched insert fields.
///
/// Summary and tags always come from the model. The title comes from the
/// model only when the caller did not supply a non-empty one.
pub(crate) async fn resolve_new_note(
    enrichment: &dyn EnrichmentBackend,
    user_id: Uuid,
    req: CreateNoteRequest,
) -> Result<NewNote, Error> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(Error::InvalidInput("Content is required".to_string()));
    }

    let summary = enrichment.summarize(&content).await?;
    let title = match req.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => enrichment.title(&content).await?,
    };
    let tags = enrichment.tags(&content).await?;

    Ok(NewNote {
        user_id,
        title,
        content,
        summary,
        tags,
    })
}

/// Resolve an update request into the field changes to persist.
///
/// New content triggers summary and tag regeneration; the title is
/// regenerated from the new content unless the caller supplied one.
/// A title-only update touches nothing else.
pub(crate) async fn resolve_changes(
    enrichment: &dyn EnrichmentBackend,
    req: UpdateNoteRequest,
) -> Result<NoteChanges, Error> {
    let mut changes = NoteChanges::default();

    let caller_title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    if let Some(content) = req.content.as_deref() {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput("Content cannot be empty".to_string()));
        }
        changes.summary = Some(enrichment.summarize(content).await?);
        changes.title = match caller_title {
            Some(t) => Some(t),
            None => Some(enrichment.title(content).await?),
        };
        changes.tags = Some(enrichment.tags(content).await?);
        changes.content = Some(content.to_string());
    } else {
        changes.title = caller_title;
    }

    if changes.title.is_none() && changes.content.is_none() {
        return Err(Error::InvalidInput("No fields to update".to_string()));
    }

    Ok(changes)
}

fn pin_matches(pin: &str, hash: &str) -> bool {
    quillnote_crypto::verify_secret(pin, hash).unwrap_or(false)
}

// =============================================================================
// CRUD HANDLERS
// =============================================================================

/// Create a note. Content is enriched (summary, tags, and title when not
/// supplied) before insert; an enrichment failure aborts the create.
pub async fn create_note(
    auth: Auth,
    State(state): State<AppState>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_note = resolve_new_note(state.enrichment.as_ref(), auth.user.id, req).await?;
    let note = state.db.notes.insert(new_note).await?;

    info!(note_id = %note.id, user_id = %note.user_id, "Note created");
    Ok((StatusCode::CREATED, Json(note)))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

/// List the caller's notes, pinned-first then newest-first, optionally
/// filtered by a case-insensitive substring search.
pub async fn list_notes(
    auth: Auth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let search = query.search.filter(|s| !s.trim().is_empty());
    let notes = state
        .db
        .notes
        .list(ListNotesRequest {
            user_id: auth.user.id,
            search,
        })
        .await?;
    Ok(Json(notes))
}

pub async fn get_note(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    let note = state.db.notes.fetch(auth.user.id, id).await?;
    Ok(Json(note))
}

/// Update a note's title and/or content. Absent fields are untouched.
pub async fn update_note(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let changes = resolve_changes(state.enrichment.as_ref(), req).await?;
    let note = state.db.notes.update(auth.user.id, id, changes).await?;

    info!(note_id = %note.id, user_id = %note.user_id, "Note updated");
    Ok(Json(note))
}

/// Hard-delete a note, then clean up its stored attachments best-effort.
pub async fn delete_note(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.db.notes.fetch(auth.user.id, id).await?;
    state.db.notes.delete(auth.user.id, id).await?;

    for file in &note.files {
        if let Err(e) = state.blobs.delete(&file.storage_id).await {
            warn!(note_id = %id, storage_id = %file.storage_id, error = %e,
                "Orphaned attachment blob after note delete");
        }
    }

    info!(note_id = %id, user_id = %auth.user.id, "Note deleted");
    Ok(Json(serde_json::json!({ "message": "Note deleted" })))
}

// =============================================================================
// PIN & LOCK HANDLERS
// =============================================================================

/// Flip the pinned flag.
pub async fn toggle_pin(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    let note = state.db.notes.toggle_pin(auth.user.id, id).await?;
    Ok(Json(note))
}

/// Lock a note with a PIN. Fails if the note is already locked.
pub async fn lock_note(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PinRequest>,
) -> Result<Json<Note>, ApiError> {
    let pin = req.pin.trim();
    if pin.is_empty() {
        return Err(ApiError::BadRequest("PIN is required".to_string()));
    }

    let note = state.db.notes.fetch(auth.user.id, id).await?;
    let pin_hash = quillnote_crypto::hash_pin(pin)?;
    let new_state = note.lock_state().set_pin(pin_hash)?;

    let note = state
        .db
        .notes
        .set_lock(auth.user.id, id, new_state.into_pin_hash())
        .await?;
    info!(note_id = %note.id, user_id = %note.user_id, "Note locked");
    Ok(Json(note))
}

/// Verify a locked note's PIN without changing its lock state. Returns the
/// note on a match, 401 on a mismatch.
pub async fn verify_pin(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PinRequest>,
) -> Result<Json<Note>, ApiError> {
    let note = state.db.notes.fetch(auth.user.id, id).await?;
    note.lock_state().verify_pin(&req.pin, pin_matches)?;
    Ok(Json(note))
}

/// Remove the lock from a note. Requires the correct PIN.
pub async fn unlock_note(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PinRequest>,
) -> Result<Json<Note>, ApiError> {
    let note = state.db.notes.fetch(auth.user.id, id).await?;
    let new_state = note.lock_state().remove_pin(&req.pin, pin_matches)?;

    let note = state
        .db
        .notes
        .set_lock(auth.user.id, id, new_state.into_pin_hash())
        .await?;
    info!(note_id = %note.id, user_id = %note.user_id, "Note unlocked");
    Ok(Json(note))
}

// =============================================================================
// ATTACHMENTS & SHARING
// =============================================================================

/// Attach an uploaded file to a note.
///
/// Accepts multipart/form-data with a `file` field. The blob is stored
/// first; the note row is only touched once the store succeeded.
pub async fn upload_file(
    auth: Auth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: axum::extract::Multipart,
) -> Result<Json<Note>, ApiError> {
    // Ownership check before accepting the body
    state.db.notes.fetch(auth.user.id, id).await?;

    let mut file_data: Option<Vec<u8>> = None;
    let mut original_name = String::from("attachment");
    let mut content_type = String::from("application/octet-stream");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            if let Some(name) = field.file_name() {
                original_name = name.to_string();
            }
            if let Some(ct) = field.content_type() {
                content_type = ct.to_string();
            }
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let data =
        file_data.ok_or_else(|| ApiError::BadRequest("Missing file in multipart form".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    let stored = state
        .blobs
        .store(&data, &original_name, &content_type)
        .await?;
    let note = state
        .db
        .notes
        .append_file(
            auth.user.id,
            id,
            NoteFile {
                url: stored.url,
                storage_id: stored.storage_id,
                original_name,
                content_type,
            },
        )
        .await?;

    info!(note_id = %note.id, user_id = %note.user_id, "Attachment uploaded");
    Ok(Json(note))
}

/// Public share endpoint. Serves a read-only projection of any note by id,
/// no authentication, lock state ignored.
pub async fn share_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SharedNoteView>, ApiError> {
    let note = state.db.notes.fetch_any(id).await?;
    Ok(Json(SharedNoteView::from(note)))
}

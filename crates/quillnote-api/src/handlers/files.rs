//! Public blob-serving handler.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use uuid::Uuid;

use quillnote_core::BlobBackend;

use crate::{ApiError, AppState};

/// Serve a stored attachment by storage id.
///
/// Unauthenticated: attachment URLs embedded in shared notes must resolve
/// without a session. The content type and filename recorded at upload time
/// are replayed from the owning note's metadata.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let storage_id = id.to_string();
    let data = state.blobs.read(&storage_id).await?;

    let meta = state.db.notes.find_file_meta(&storage_id).await?;
    let (content_type, disposition) = match meta {
        Some(file) => (
            file.content_type,
            format!("inline; filename=\"{}\"", file.original_name.replace('"', "")),
        ),
        None => ("application/octet-stream".to_string(), "inline".to_string()),
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}

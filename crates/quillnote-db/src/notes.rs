//! Note repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use quillnote_core::{
    new_v7, Error, ListNotesRequest, NewNote, Note, NoteChanges, NoteFile, NoteRepository, Result,
};

use crate::escape_like;

const NOTE_COLUMNS: &str = "id, user_id, title, content, summary, tags, is_pinned, is_locked, \
                            pin_hash, files, created_at_utc, updated_at_utc";

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Look up attachment metadata by storage id across all notes.
    ///
    /// Used by the public file-serving endpoint to recover the original
    /// name and content type recorded at upload time.
    pub async fn find_file_meta(&self, storage_id: &str) -> Result<Option<NoteFile>> {
        let row = sqlx::query(
            r#"
            SELECT f AS file
            FROM note, jsonb_array_elements(files) AS f
            WHERE f->>'storage_id' = $1
            LIMIT 1
            "#,
        )
        .bind(storage_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let value: serde_json::Value = row.get("file");
                Ok(Some(serde_json::from_value(value)?))
            }
            None => Ok(None),
        }
    }
}

/// Map a database row to a Note.
fn map_row_to_note(row: sqlx::postgres::PgRow) -> Result<Note> {
    let files: serde_json::Value = row.get("files");
    let files: Vec<NoteFile> = serde_json::from_value(files)?;

    Ok(Note {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        content: row.get("content"),
        summary: row.get("summary"),
        tags: row.get("tags"),
        is_pinned: row.get("is_pinned"),
        is_locked: row.get("is_locked"),
        pin_hash: row.get("pin_hash"),
        files,
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    })
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, note: NewNote) -> Result<Note> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO note (id, user_id, title, content, summary, tags)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {NOTE_COLUMNS}"#
        ))
        .bind(new_v7())
        .bind(note.user_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.summary)
        .bind(&note.tags)
        .fetch_one(&self.pool)
        .await?;

        map_row_to_note(row)
    }

    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!(
            "SELECT {NOTE_COLUMNS} FROM note WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NoteNotFound(id))?;

        map_row_to_note(row)
    }

    async fn fetch_any(&self, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!("SELECT {NOTE_COLUMNS} FROM note WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::NoteNotFound(id))?;

        map_row_to_note(row)
    }

    async fn list(&self, req: ListNotesRequest) -> Result<Vec<Note>> {
        // Pinned notes first, then newest-first by creation time.
        let rows = match &req.search {
            Some(search) if !search.trim().is_empty() => {
                let pattern = format!("%{}%", escape_like(search.trim()));
                sqlx::query(&format!(
                    r#"SELECT {NOTE_COLUMNS} FROM note
                       WHERE user_id = $1
                         AND (title ILIKE $2 ESCAPE '\' OR content ILIKE $2 ESCAPE '\')
                       ORDER BY is_pinned DESC, created_at_utc DESC"#
                ))
                .bind(req.user_id)
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            _ => {
                sqlx::query(&format!(
                    r#"SELECT {NOTE_COLUMNS} FROM note
                       WHERE user_id = $1
                       ORDER BY is_pinned DESC, created_at_utc DESC"#
                ))
                .bind(req.user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!(
            subsystem = "database",
            component = "notes",
            op = "list",
            user_id = %req.user_id,
            result_count = rows.len(),
            "Listed notes"
        );

        rows.into_iter().map(map_row_to_note).collect()
    }

    async fn update(&self, user_id: Uuid, id: Uuid, changes: NoteChanges) -> Result<Note> {
        // Build the SET clause from the fields actually present.
        let mut sets = vec!["updated_at_utc = now()".to_string()];
        let mut param_idx = 3; // $1 = id, $2 = user_id

        if changes.title.is_some() {
            sets.push(format!("title = ${param_idx}"));
            param_idx += 1;
        }
        if changes.content.is_some() {
            sets.push(format!("content = ${param_idx}"));
            param_idx += 1;
        }
        if changes.summary.is_some() {
            sets.push(format!("summary = ${param_idx}"));
            param_idx += 1;
        }
        if changes.tags.is_some() {
            sets.push(format!("tags = ${param_idx}"));
        }

        let sql = format!(
            "UPDATE note SET {} WHERE id = $1 AND user_id = $2 RETURNING {NOTE_COLUMNS}",
            sets.join(", ")
        );

        let mut query = sqlx::query(&sql).bind(id).bind(user_id);
        if let Some(title) = &changes.title {
            query = query.bind(title);
        }
        if let Some(content) = &changes.content {
            query = query.bind(content);
        }
        if let Some(summary) = &changes.summary {
            query = query.bind(summary);
        }
        if let Some(tags) = &changes.tags {
            query = query.bind(tags);
        }

        let row = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::NoteNotFound(id))?;

        map_row_to_note(row)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    async fn toggle_pin(&self, user_id: Uuid, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!(
            r#"UPDATE note
               SET is_pinned = NOT is_pinned, updated_at_utc = now()
               WHERE id = $1 AND user_id = $2
               RETURNING {NOTE_COLUMNS}"#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NoteNotFound(id))?;

        map_row_to_note(row)
    }

    async fn set_lock(&self, user_id: Uuid, id: Uuid, pin_hash: Option<String>) -> Result<Note> {
        // is_locked is derived from the hash so the lock invariant cannot
        // drift (the table carries a matching CHECK constraint).
        let row = sqlx::query(&format!(
            r#"UPDATE note
               SET is_locked = $3, pin_hash = $4, updated_at_utc = now()
               WHERE id = $1 AND user_id = $2
               RETURNING {NOTE_COLUMNS}"#
        ))
        .bind(id)
        .bind(user_id)
        .bind(pin_hash.is_some())
        .bind(&pin_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NoteNotFound(id))?;

        map_row_to_note(row)
    }

    async fn append_file(&self, user_id: Uuid, id: Uuid, file: NoteFile) -> Result<Note> {
        let file_json = serde_json::to_value(&file)?;
        let row = sqlx::query(&format!(
            r#"UPDATE note
               SET files = files || jsonb_build_array($3::jsonb), updated_at_utc = now()
               WHERE id = $1 AND user_id = $2
               RETURNING {NOTE_COLUMNS}"#
        ))
        .bind(id)
        .bind(user_id)
        .bind(file_json)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NoteNotFound(id))?;

        map_row_to_note(row)
    }
}

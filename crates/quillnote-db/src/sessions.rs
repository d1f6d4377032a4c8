//! Session repository implementation.
//!
//! Sessions back the opaque bearer tokens issued at login. Only SHA-256
//! hashes of tokens are persisted; lookups are by hash and filter out
//! expired rows, which are purged opportunistically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use quillnote_core::{new_v7, Result, Session, SessionRepository};

/// PostgreSQL implementation of SessionRepository.
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_session(row: sqlx::postgres::PgRow) -> Session {
    Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        token_hash: row.get("token_hash"),
        expires_at: row.get("expires_at"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn insert(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let row = sqlx::query(
            r#"INSERT INTO session (id, user_id, token_hash, expires_at)
               VALUES ($1, $2, $3, $4)
               RETURNING id, user_id, token_hash, expires_at, created_at_utc"#,
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_row_to_session(row))
    }

    async fn find_valid(&self, token_hash: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"SELECT id, user_id, token_hash, expires_at, created_at_utc
               FROM session
               WHERE token_hash = $1 AND expires_at > now()"#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row_to_session))
    }

    async fn revoke(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM session WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(
                subsystem = "database",
                component = "sessions",
                op = "purge_expired",
                result_count = removed,
                "Purged expired sessions"
            );
        }
        Ok(removed)
    }
}

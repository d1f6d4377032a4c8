//! Bearer-token authentication extractor.
//!
//! Tokens are opaque `qn_at_...` strings issued at login. Only their SHA-256
//! hashes are stored, so validation hashes the presented token and looks up
//! an unexpired session row.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use quillnote_core::{SessionRepository, User, UserRepository};

use crate::{ApiError, AppState};

/// Extractor for authenticated requests.
///
/// Usage:
/// ```ignore
/// async fn my_handler(auth: Auth, State(state): State<AppState>) -> ... {
///     let user_id = auth.user.id;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Auth {
    /// The authenticated user.
    pub user: User,
    /// Hash of the presented token, kept for logout revocation.
    pub token_hash: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = match auth_header {
            Some(header) if header.starts_with("Bearer ") => {
                header.trim_start_matches("Bearer ").trim()
            }
            _ => {
                return Err(ApiError::Unauthorized(
                    "Missing Authorization header".to_string(),
                ))
            }
        };

        if !quillnote_crypto::looks_like_token(token) {
            return Err(ApiError::Unauthorized("Invalid token".to_string()));
        }

        let token_hash = quillnote_crypto::hash_token(token);
        let session = state
            .db
            .sessions
            .find_valid(&token_hash)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        let user = state
            .db
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(Auth { user, token_hash })
    }
}

//! API error type and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Error type returned by all HTTP handlers.
///
/// Serialized as `{"error": message}` with the mapped status code.
#[derive(Debug)]
pub enum ApiError {
    Database(quillnote_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<quillnote_core::Error> for ApiError {
    fn from(err: quillnote_core::Error) -> Self {
        match &err {
            quillnote_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            quillnote_core::Error::NoteNotFound(_) => ApiError::NotFound(err.to_string()),
            quillnote_core::Error::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            quillnote_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            quillnote_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            quillnote_core::Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    // Friendly messages for known unique constraints
                    let friendly_msg = if msg.contains("app_user_email") {
                        "An account with this email already exists".to_string()
                    } else {
                        msg
                    };
                    return ApiError::Conflict(friendly_msg);
                }
                ApiError::Database(err)
            }
            _ => ApiError::Database(err),
        }
    }
}

impl From<quillnote_crypto::CryptoError> for ApiError {
    fn from(err: quillnote_crypto::CryptoError) -> Self {
        match err {
            quillnote_crypto::CryptoError::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Database(quillnote_core::Error::Internal(other.to_string())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

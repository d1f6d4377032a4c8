//! Registration, login, and logout handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use tracing::{debug, info, warn};

use quillnote_core::{
    LoginRequest, LoginResponse, NewUser, RegisterRequest, SessionRepository, UserRepository,
    UserView,
};

use crate::auth::Auth;
use crate::{ApiError, AppState};

/// Register a new user.
///
/// Returns 201 with the created user (no credentials), 400 on blank fields
/// or a malformed email, 409 on a duplicate email.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    let password_hash = quillnote_crypto::hash_password(&req.password)?;
    let user = state
        .db
        .users
        .insert(NewUser {
            name: name.to_string(),
            email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

/// Log in with email and password.
///
/// On success issues an opaque bearer token and responds `{token, user}`.
/// Wrong email and wrong password produce the same 401 message.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();

    let user = state
        .db
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = quillnote_crypto::verify_secret(&req.password, &user.password_hash)?;
    if !valid {
        warn!(user_id = %user.id, "Failed login attempt");
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    // Opportunistic cleanup of expired sessions
    if let Err(e) = state.db.sessions.purge_expired().await {
        debug!(error = %e, "Expired session purge failed");
    }

    let token = quillnote_crypto::generate_token();
    let token_hash = quillnote_crypto::hash_token(&token);
    let expires_at = Utc::now() + state.session_ttl;
    state
        .db
        .sessions
        .insert(user.id, &token_hash, expires_at)
        .await?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// Revoke the presented bearer token.
pub async fn logout(
    auth: Auth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.sessions.revoke(&auth.token_hash).await?;
    info!(user_id = %auth.user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

//! quillnote-api - HTTP API server for quillnote

mod auth;
mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use quillnote_core::{defaults, BlobBackend, EnrichmentBackend};
use quillnote_db::{Database, FilesystemBlobBackend};
use quillnote_inference::GroqBackend;

pub use error::ApiError;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically and line up
/// with log timestamps when correlating requests.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// Language-model backend for summaries, titles, and tags.
    pub enrichment: Arc<dyn EnrichmentBackend>,
    /// Blob store for note attachments.
    pub blobs: Arc<dyn BlobBackend>,
    /// Lifetime applied to newly issued session tokens.
    pub session_ttl: chrono::Duration,
}

// =============================================================================
// CORS
// =============================================================================

/// Parse the list of allowed CORS origins from the environment.
///
/// `ALLOWED_ORIGINS` - comma-separated list; defaults to local dev origins.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

    let parsed: Vec<HeaderValue> = origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if parsed.is_empty() {
        vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
        ]
    } else {
        parsed
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "quillnote_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quillnote_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("quillnote-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/quillnote".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| defaults::PORT.to_string())
        .parse()
        .unwrap_or(defaults::PORT);
    let session_ttl_hours: i64 = std::env::var("SESSION_TTL_HOURS")
        .unwrap_or_else(|_| defaults::SESSION_TTL_HOURS.to_string())
        .parse()
        .unwrap_or(defaults::SESSION_TTL_HOURS);

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Initialize blob storage
    let blob_path = std::env::var("BLOB_STORAGE_PATH")
        .unwrap_or_else(|_| defaults::BLOB_STORAGE_PATH.to_string());
    let public_base_url =
        std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
    let blobs = FilesystemBlobBackend::new(&blob_path, public_base_url);
    blobs
        .validate()
        .await
        .map_err(|e| anyhow::anyhow!("Blob storage validation failed: {}", e))?;
    info!("Blob storage initialized at {}", blob_path);

    // Initialize enrichment backend (requires GROQ_API_KEY)
    let enrichment = GroqBackend::from_env()?;
    info!("Enrichment backend initialized: {}", enrichment.model());

    // Create app state
    let state = AppState {
        db: Arc::new(db),
        enrichment: Arc::new(enrichment),
        blobs: Arc::new(blobs),
        session_ttl: chrono::Duration::hours(session_ttl_hours),
    };

    let app = app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router with all routes and middleware.
fn app(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        // Notes CRUD
        .route(
            "/api/v1/notes",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        // Public share link (no auth)
        .route("/api/v1/notes/share/:id", get(handlers::notes::share_note))
        .route(
            "/api/v1/notes/:id",
            get(handlers::notes::get_note)
                .put(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        )
        // Pin & lock
        .route("/api/v1/notes/:id/pin", patch(handlers::notes::toggle_pin))
        .route("/api/v1/notes/:id/lock", patch(handlers::notes::lock_note))
        .route(
            "/api/v1/notes/:id/verify-pin",
            patch(handlers::notes::verify_pin),
        )
        .route(
            "/api/v1/notes/:id/unlock",
            patch(handlers::notes::unlock_note),
        )
        // Attachments
        .route(
            "/api/v1/notes/:id/upload",
            post(handlers::notes::upload_file),
        )
        .route("/files/:id", get(handlers::files::serve_file))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600))
        })
        .layer(RequestBodyLimitLayer::new(defaults::MAX_BODY_BYTES))
        .with_state(state)
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quillnote_db::test_fixtures;
    use quillnote_inference::mock::MockEnrichmentBackend;

    /// Spawn the full app on an ephemeral port against the test database,
    /// with a mock enrichment backend and a temporary blob directory.
    /// The returned TempDir must stay alive for the duration of the test.
    async fn spawn_test_server() -> (String, Arc<Database>, tempfile::TempDir) {
        let db = Arc::new(test_fixtures::test_database().await);
        let blob_dir = tempfile::tempdir().expect("create temp blob dir");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let enrichment = MockEnrichmentBackend::new()
            .with_summary("A short errand reminder.")
            .with_title("Grocery run")
            .with_tags(vec!["errands".to_string(), "shopping".to_string()]);
        let blobs = FilesystemBlobBackend::new(blob_dir.path(), base_url.clone());

        let state = AppState {
            db: db.clone(),
            enrichment: Arc::new(enrichment),
            blobs: Arc::new(blobs),
            session_ttl: chrono::Duration::hours(1),
        };

        let router = app(state);
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        (base_url, db, blob_dir)
    }

    /// Register and log in a fresh user. Returns (user_id, token).
    async fn register_and_login(client: &reqwest::Client, base_url: &str) -> (Uuid, String) {
        let email = format!("flow-{}@example.com", Uuid::new_v4());

        let resp = client
            .post(format!("{}/api/v1/auth/register", base_url))
            .json(&serde_json::json!({
                "name": "Flow Tester",
                "email": email,
                "password": "correct horse battery staple",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let user: serde_json::Value = resp.json().await.unwrap();
        let user_id: Uuid = user["id"].as_str().unwrap().parse().unwrap();

        let resp = client
            .post(format!("{}/api/v1/auth/login", base_url))
            .json(&serde_json::json!({
                "email": email,
                "password": "correct horse battery staple",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        (user_id, body["token"].as_str().unwrap().to_string())
    }

    /// Full note lifecycle over HTTP: register, login, create, update,
    /// delete, then confirm the note is gone.
    #[tokio::test]
    #[ignore] // Requires DATABASE_URL with migrated database
    async fn test_note_lifecycle_flow() {
        let (base_url, db, _blob_dir) = spawn_test_server().await;
        let client = reqwest::Client::new();
        let (user_id, token) = register_and_login(&client, &base_url).await;

        // Unauthenticated requests get the standard error body
        let resp = client
            .get(format!("{}/api/v1/notes", base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Missing Authorization header");

        // Create without a title: enrichment fills in title, summary, tags
        let resp = client
            .post(format!("{}/api/v1/notes", base_url))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "content": "Buy milk and eggs" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let note: serde_json::Value = resp.json().await.unwrap();
        let note_id = note["id"].as_str().unwrap().to_string();
        assert_eq!(note["title"], "Grocery run");
        assert_eq!(note["summary"], "A short errand reminder.");
        assert_eq!(note["tags"][0], "errands");

        // Title-only update leaves content untouched
        let resp = client
            .put(format!("{}/api/v1/notes/{}", base_url, note_id))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "title": "Saturday errands" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let note: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(note["title"], "Saturday errands");
        assert_eq!(note["content"], "Buy milk and eggs");

        // Delete, then a fetch 404s
        let resp = client
            .delete(format!("{}/api/v1/notes/{}", base_url, note_id))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Note deleted");

        let resp = client
            .get(format!("{}/api/v1/notes/{}", base_url, note_id))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        test_fixtures::cleanup_test_user(&db, user_id).await;
    }

    /// Lock, verify-pin, and unlock over HTTP with real Argon2 hashing.
    #[tokio::test]
    #[ignore] // Requires DATABASE_URL with migrated database
    async fn test_lock_flow() {
        let (base_url, db, _blob_dir) = spawn_test_server().await;
        let client = reqwest::Client::new();
        let (user_id, token) = register_and_login(&client, &base_url).await;

        let resp = client
            .post(format!("{}/api/v1/notes", base_url))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "content": "Private thoughts" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let note: serde_json::Value = resp.json().await.unwrap();
        let note_id = note["id"].as_str().unwrap().to_string();

        // Blank PIN is rejected
        let resp = client
            .patch(format!("{}/api/v1/notes/{}/lock", base_url, note_id))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "pin": "  " }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        // Lock: is_locked flips, the PIN hash never leaves the server
        let resp = client
            .patch(format!("{}/api/v1/notes/{}/lock", base_url, note_id))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "pin": "4312" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let note: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(note["is_locked"], true);
        assert!(note.get("pin_hash").is_none());

        // Locking an already-locked note fails
        let resp = client
            .patch(format!("{}/api/v1/notes/{}/lock", base_url, note_id))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "pin": "9999" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        // Wrong PIN: 401 with the standard error body
        let resp = client
            .patch(format!("{}/api/v1/notes/{}/verify-pin", base_url, note_id))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "pin": "0000" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "incorrect PIN");

        // Correct PIN grants the read without changing lock state
        let resp = client
            .patch(format!("{}/api/v1/notes/{}/verify-pin", base_url, note_id))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "pin": "4312" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let note: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(note["is_locked"], true);

        // Unlock rejects the wrong PIN, accepts the right one
        let resp = client
            .patch(format!("{}/api/v1/notes/{}/unlock", base_url, note_id))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "pin": "0000" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        let resp = client
            .patch(format!("{}/api/v1/notes/{}/unlock", base_url, note_id))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "pin": "4312" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let note: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(note["is_locked"], false);

        test_fixtures::cleanup_test_user(&db, user_id).await;
    }
}

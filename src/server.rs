//! HTTP host for a shared session.
//!
//! One [`Session`] lives for the lifetime of the server; every request
//! reads or mutates it behind a mutex. Session calls are synchronous (index
//! rebuilds can embed every chunk), so handlers run them on the blocking
//! thread pool.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/status` | Document and chunk counts, uploaded files |
//! | `POST` | `/documents?filename=<name>` | Upload raw document bytes |
//! | `POST` | `/ask` | Answer `{ "query": "..." }` |
//! | `POST` | `/reset` | Drop all documents |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "filename must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser page can
//! upload and ask directly.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use ragdesk_core::models::SearchHit;
use ragdesk_core::Session;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::embedding::create_strategy;

/// Uploads larger than this are rejected by axum with 413.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` against the session on the blocking pool.
    async fn with_session<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Session) -> T + Send + 'static,
        T: Send + 'static,
    {
        let session = self.session.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = session
                .lock()
                .map_err(|_| internal("session lock poisoned"))?;
            Ok(f(&mut *guard))
        })
        .await
        .map_err(|e| internal(format!("session task failed: {}", e)))?
    }
}

/// Build the router with all routes and CORS applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route("/documents", post(handle_upload))
        .route("/ask", post(handle_ask))
        .route("/reset", post(handle_reset))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` with a fresh session.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&config.server.bind).await?;
    serve(listener, config).await
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, config: &Config) -> anyhow::Result<()> {
    let session = Session::new(config.session_params(), create_strategy(config)?);
    let strategy = session.strategy_name().to_string();
    let app = router(AppState::new(session));

    info!(addr = %listener.local_addr()?, strategy = %strategy, "ragdesk server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 Internal Server Error.
fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /status ============

#[derive(Serialize)]
struct FileStatus {
    filename: String,
    chars: usize,
    added_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct StatusResponse {
    documents: usize,
    chunks: usize,
    strategy: String,
    files: Vec<FileStatus>,
}

async fn handle_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let status = state
        .with_session(|session| StatusResponse {
            documents: session.document_count(),
            chunks: session.chunk_count(),
            strategy: session.strategy_name().to_string(),
            files: session
                .documents()
                .iter()
                .map(|d| FileStatus {
                    filename: d.filename.clone(),
                    chars: d.char_count(),
                    added_at: d.added_at,
                })
                .collect(),
        })
        .await?;
    Ok(Json(status))
}

// ============ POST /documents ============

#[derive(Deserialize)]
struct UploadParams {
    filename: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    /// False when the upload held no text and was ignored.
    accepted: bool,
    documents: usize,
    chunks: usize,
}

/// Handler for `POST /documents?filename=<name>`.
///
/// The request body is the raw file content in any encoding the loader
/// understands. Returns `400` when `filename` is missing or blank.
async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    let filename = params
        .filename
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| bad_request("filename must not be empty"))?;

    let response = state
        .with_session(move |session| {
            let accepted = session.add_document(&body, &filename);
            UploadResponse {
                accepted,
                documents: session.document_count(),
                chunks: session.chunk_count(),
            }
        })
        .await?;
    Ok(Json(response))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    query: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    passages: Vec<SearchHit>,
}

/// Handler for `POST /ask`.
///
/// An empty query is not an error; it yields the no-results answer.
async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let response = state
        .with_session(move |session| {
            let (answer, passages) = session.ask_with_hits(&request.query);
            AskResponse { answer, passages }
        })
        .await?;
    Ok(Json(response))
}

// ============ POST /reset ============

#[derive(Serialize)]
struct ResetResponse {
    documents: usize,
    chunks: usize,
}

async fn handle_reset(State(state): State<AppState>) -> Result<Json<ResetResponse>, AppError> {
    let response = state
        .with_session(|session| {
            session.reset();
            ResetResponse {
                documents: session.document_count(),
                chunks: session.chunk_count(),
            }
        })
        .await?;
    Ok(Json(response))
}

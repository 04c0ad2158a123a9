//! HTTP API server.
//!
//! A thin transport layer over [`RagService`]: multipart upload, chat,
//! summarize, document listing, and deletion. Permissive CORS supports
//! browser frontends.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload` | Upload a document (multipart `file` field) |
//! | `POST` | `/chat` | Ask a question, get an answer with sources |
//! | `POST` | `/summarize` | Summarize text into a chosen language |
//! | `GET`  | `/documents` | Grouped-by-source view of the index |
//! | `DELETE` | `/documents/{source}` | Remove a document's entries |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error contract
//!
//! ```json
//! { "error": { "code": "unsupported_format", "message": "..." } }
//! ```
//!
//! Codes: `bad_request` (400), `not_found` (404), `unsupported_format`
//! (415), `extraction_failed` (422), `provider_error` (502), `internal`
//! (500).

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::error::Error;
use crate::models::{Citation, DocumentHit, DocumentSummary, SourceType};
use crate::service::RagService;

/// Shared application state for all route handlers.
#[derive(Clone)]
struct AppState {
    service: Arc<RagService>,
}

/// Start the HTTP server on the configured bind address. Runs until the
/// process is terminated.
pub async fn run_server(service: Arc<RagService>) -> anyhow::Result<()> {
    let bind_addr = service.config().server.bind.clone();
    let max_upload = service.config().server.max_upload_bytes;
    let state = AppState { service };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/upload", post(handle_upload))
        .route("/chat", post(handle_chat))
        .route("/summarize", post(handle_summarize))
        .route("/documents", get(handle_list_documents))
        .route("/documents/{source}", delete(handle_delete_document))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .with_state(state);

    tracing::info!(addr = %bind_addr, "server listening");
    println!("IntraMate server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
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

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Map a pipeline error to its status code and wire code by downcasting to
/// the crate's error taxonomy; anything unrecognized is a 500.
fn classify_error(err: anyhow::Error) -> AppError {
    let (status, code) = match err.downcast_ref::<Error>() {
        Some(Error::Config(_)) => (StatusCode::BAD_REQUEST, "bad_request"),
        Some(Error::UnsupportedFormat(_)) => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_format")
        }
        Some(Error::Extraction(_)) => (StatusCode::UNPROCESSABLE_ENTITY, "extraction_failed"),
        Some(Error::Provider(_)) => (StatusCode::BAD_GATEWAY, "provider_error"),
        Some(Error::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    AppError {
        status,
        code: code.to_string(),
        message: err.to_string(),
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

// ============ POST /upload ============

#[derive(Serialize)]
struct UploadResponse {
    status: String,
    message: String,
    chunks: usize,
}

/// Accepts a multipart form with a `file` field. The upload is staged to
/// the uploads directory, processed, and the staged file removed.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let uploads_dir = state.service.config().server.uploads_dir.clone();
    std::fs::create_dir_all(&uploads_dir)
        .map_err(|e| classify_error(anyhow::Error::from(e)))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|n| n.to_string())
            .ok_or_else(|| bad_request("file field has no filename"))?;
        // Strip any path components a client may have sent.
        let file_name = std::path::Path::new(&file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| bad_request("invalid filename"))?
            .to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(e.to_string()))?;

        let staged = uploads_dir.join(&file_name);
        std::fs::write(&staged, &bytes).map_err(|e| classify_error(anyhow::Error::from(e)))?;

        let outcome = state.service.upload_document(&staged).await;
        let _ = std::fs::remove_file(&staged);
        let outcome = outcome.map_err(classify_error)?;

        return Ok(Json(UploadResponse {
            status: "success".to_string(),
            message: format!(
                "Document processed successfully into {} chunks",
                outcome.chunks
            ),
            chunks: outcome.chunks,
        }));
    }

    Err(bad_request("multipart request is missing a 'file' field"))
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    question: String,
    #[serde(default = "default_language")]
    language: String,
}

fn default_language() -> String {
    "English".to_string()
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    sources: SourcesBody,
}

#[derive(Serialize)]
struct SourcesBody {
    #[serde(rename = "type")]
    source_type: SourceType,
    documents: Vec<DocumentHit>,
    web: Vec<Citation>,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    let outcome = state
        .service
        .ask_question(&request.question, &request.language)
        .await
        .map_err(classify_error)?;

    Ok(Json(ChatResponse {
        answer: outcome.answer,
        sources: SourcesBody {
            source_type: outcome.retrieval.source_type,
            documents: outcome.retrieval.document_hits,
            web: outcome.retrieval.web_citations,
        },
    }))
}

// ============ POST /summarize ============

#[derive(Deserialize)]
struct SummarizeRequest {
    text: String,
    #[serde(default = "default_language")]
    language: String,
}

#[derive(Serialize)]
struct SummarizeResponse {
    summary: String,
}

async fn handle_summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(bad_request("text must not be empty"));
    }

    let summary = state
        .service
        .summarize_text(&request.text, &request.language)
        .await
        .map_err(classify_error)?;

    Ok(Json(SummarizeResponse { summary }))
}

// ============ GET /documents ============

#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<DocumentSummary>,
}

async fn handle_list_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentsResponse>, AppError> {
    let documents = state
        .service
        .list_documents()
        .await
        .map_err(classify_error)?;
    Ok(Json(DocumentsResponse { documents }))
}

// ============ DELETE /documents/{source} ============

#[derive(Serialize)]
struct DeleteResponse {
    status: String,
    message: String,
}

async fn handle_delete_document(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let removed = state
        .service
        .delete_document(&source)
        .await
        .map_err(classify_error)?;

    Ok(Json(DeleteResponse {
        status: "success".to_string(),
        message: format!("Deleted {} ({} chunks)", source, removed),
    }))
}

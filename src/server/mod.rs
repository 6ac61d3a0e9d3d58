//! HTTP front for the lesson plan generator: one endpoint asks the
//! completion service for a plan, two turn a plan into a download.

pub mod completion;
pub mod prompt;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{ArtifactKind, DocxOptions, Error, PdfOptions, export_docx, export_pdf};

use completion::CompletionService;
use prompt::{LessonRequest, lenient_string};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        log::error!("request failed: {}", self.message);
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State and configuration
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub completion: Arc<dyn CompletionService>,
    pub docx: Arc<DocxOptions>,
    pub pdf: Arc<PdfOptions>,
    /// Where temporary artifacts are written; system temp dir when `None`.
    pub temp_dir: Option<Arc<PathBuf>>,
}

impl AppState {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            docx: Arc::new(DocxOptions::default()),
            pdf: Arc::new(PdfOptions::default()),
            temp_dir: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
            allowed_origins: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub lesson_plan: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub lesson_plan: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/generate_lessonplan", post(generate_lessonplan))
        .route("/download_lessonplan_docx", post(download_lessonplan_docx))
        .route("/download_lessonplan_pdf", post(download_lessonplan_pdf))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, config: &ServerConfig) -> Result<(), Error> {
    let app = build_router(state, &config.allowed_origins);
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .map_err(|e| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("bad listen address {}:{}: {e}", config.bind, config.port),
            ))
        })?;
    log::info!("lessonplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("lessonplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn generate_lessonplan(
    State(state): State<AppState>,
    Json(req): Json<LessonRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    log::info!(
        "generate: subject={:?} topic={:?} grade={:?}",
        req.subject,
        req.topic,
        req.grade
    );
    let lesson_plan = state
        .completion
        .complete(&prompt::messages(&req))
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;
    Ok(Json(GenerateResponse { lesson_plan }))
}

fn attachment(kind: ArtifactKind, bytes: Vec<u8>) -> Response {
    let headers = [
        (header::CONTENT_TYPE, kind.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", kind.download_name()),
        ),
    ];
    (headers, bytes).into_response()
}

/// Render on the blocking pool; the temporary artifact is read back and
/// deleted before the response is built.
async fn export_download(
    state: AppState,
    kind: ArtifactKind,
    lesson_plan: String,
) -> Result<Response, AppError> {
    let bytes = tokio::task::spawn_blocking(move || {
        let temp_dir = state.temp_dir.as_deref().map(PathBuf::as_path);
        let artifact = match kind {
            ArtifactKind::Docx => export_docx(&lesson_plan, &state.docx, temp_dir)?,
            ArtifactKind::Pdf => export_pdf(&lesson_plan, &state.pdf, temp_dir)?,
        };
        artifact.into_bytes()
    })
    .await
    .map_err(|e| AppError::internal(format!("export task failed: {e}")))??;
    Ok(attachment(kind, bytes))
}

async fn download_lessonplan_docx(
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, AppError> {
    export_download(state, ArtifactKind::Docx, req.lesson_plan).await
}

async fn download_lessonplan_pdf(
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, AppError> {
    export_download(state, ArtifactKind::Pdf, req.lesson_plan).await
}

//! HTTP service: POST HTML, receive PDF.
//!
//! | Route           | Method | Response                                   |
//! |-----------------|--------|--------------------------------------------|
//! | `/`             | GET    | usage text                                 |
//! | `/generate.pdf` | any    | body converted to PDF (`application/pdf`)  |
//! | `/version`      | GET    | crate + renderer version (always `200`)    |
//!
//! Each request runs on its own tokio task. The shared [`AppState`] is
//! read-only, so renders never wait on each other.

use crate::config::PdfOptions;
use crate::convert::Converter;
use crate::error::Html2PdfError;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 80;

/// Default cap on the request body (HTML source) size: 16 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Usage text served on `/`.
pub const INDEX_TEXT: &str = "\
html2pdf — HTML to PDF conversion service

To generate a PDF, POST (or send with any method) your HTML as the request
body to /generate.pdf.

For example:

    curl -d '<h1>this is html</h1>' http://localhost:8000/generate.pdf > created.pdf
    open created.pdf

Sources starting with \"http\" or \"www\" are rejected: only inline HTML is
rendered. GET /version reports the service and renderer versions.
";

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
    /// Options applied to every conversion.
    pub defaults: Arc<PdfOptions>,
    /// Largest accepted request body in bytes.
    pub body_limit: usize,
}

impl AppState {
    pub fn new(converter: Converter, defaults: PdfOptions) -> Self {
        Self {
            converter: Arc::new(converter),
            defaults: Arc::new(defaults),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/", get(index))
        .route("/generate.pdf", any(generate))
        .route("/version", get(version))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), Html2PdfError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("starting html2pdf server on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index() -> &'static str {
    INDEX_TEXT
}

async fn version(State(state): State<AppState>) -> String {
    state.converter.version().await
}

async fn generate(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let source = String::from_utf8(body.to_vec()).map_err(Html2PdfError::from)?;
    let pdf = state.converter.generate_pdf(&source, &state.defaults).await?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], pdf).into_response())
}

// ── Errors ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: &'static str,
    pub message: String,
}

/// A conversion failure rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Html2PdfError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Html2PdfError::InvalidSource { .. } | Html2PdfError::InvalidUtf8(_) => {
                StatusCode::BAD_REQUEST
            }
            Html2PdfError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Html2PdfError> for ApiError {
    fn from(e: Html2PdfError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("conversion failed: {}", self.0);
        } else {
            warn!("rejected request: {}", self.0);
        }
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.0.kind(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

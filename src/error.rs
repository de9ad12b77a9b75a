//! Error types for the edgequake-html2pdf library.
//!
//! Every failure of the conversion pipeline is a [`Html2PdfError`] and is
//! returned to the caller of that conversion. There is no partial result:
//! a render either produced PDF bytes or it failed.
//!
//! Two parts of the pipeline never produce an error on purpose:
//!
//! * the metadata patcher, which silently leaves the document untouched when
//!   it cannot find the `/Title … /Producer` region, and
//! * [`crate::convert::Converter::version`], which describes a failure in
//!   place of the renderer's version string.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-html2pdf library.
#[derive(Debug, Error)]
pub enum Html2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The source document looks like a URL. Rejected before any process is
    /// spawned; fetching remote pages is not supported.
    #[error("PDF generation from URLs is not supported (source starts with {prefix:?})")]
    InvalidSource { prefix: String },

    /// The request body could not be decoded as UTF-8 text.
    #[error("Source document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    // ── Renderer errors ───────────────────────────────────────────────────
    /// The renderer exited with a failure status AND its output does not
    /// start with the `%PDF` signature.
    #[error("error running wkhtmltopdf, command: {args:?}\nresponse: \"{stderr}\"")]
    Render { args: Vec<String>, stderr: String },

    /// The renderer binary could not be started.
    #[error("Failed to start renderer '{program}': {source}\nSet WKHTMLTOPDF_PATH or install wkhtmltopdf.")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The renderer did not finish within the configured timeout.
    #[error("Renderer timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Reading from or writing to the renderer's standard streams failed.
    #[error("Renderer I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed or an options file could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Html2PdfError {
    /// Short, stable name of the variant.
    ///
    /// Used by the version report and by the HTTP error body.
    pub fn kind(&self) -> &'static str {
        match self {
            Html2PdfError::InvalidSource { .. } => "InvalidSource",
            Html2PdfError::InvalidUtf8(_) => "InvalidUtf8",
            Html2PdfError::Render { .. } => "Render",
            Html2PdfError::Spawn { .. } => "Spawn",
            Html2PdfError::Timeout { .. } => "Timeout",
            Html2PdfError::Io(_) => "Io",
            Html2PdfError::OutputWriteFailed { .. } => "OutputWriteFailed",
            Html2PdfError::InvalidConfig(_) => "InvalidConfig",
            Html2PdfError::Internal(_) => "Internal",
        }
    }

    /// `true` when the caller supplied something unusable, as opposed to the
    /// renderer or the host failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Html2PdfError::InvalidSource { .. } | Html2PdfError::InvalidUtf8(_)
        )
    }
}

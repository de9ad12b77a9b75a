//! # edgequake-html2pdf
//!
//! Convert HTML to PDF with [wkhtmltopdf](https://wkhtmltopdf.org), as an
//! async library, a CLI and an HTTP service.
//!
//! Rendering is delegated entirely to the external `wkhtmltopdf` binary. This
//! crate builds its command line, runs it without blocking the async runtime,
//! decides whether the run succeeded, and writes document metadata into the
//! result.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML
//!  │
//!  ├─ 1. Guard     reject sources that look like URLs
//!  ├─ 2. Args      typed + extra options → `--flag [value]… - -`
//!  ├─ 3. Execute   wkhtmltopdf: HTML on stdin, PDF on stdout (tokio::process)
//!  ├─ 4. Policy    success = exit 0 OR output starts with %PDF
//!  ├─ 5. Metadata  rewrite /Title … /Producer in place
//!  └─ 6. Output    PDF bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_html2pdf::{Converter, ConverterConfig, PdfOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Binary from WKHTMLTOPDF_PATH, else `wkhtmltopdf` on PATH.
//!     let converter = Converter::new(ConverterConfig::builder().timeout_secs(60).build()?);
//!     let options = PdfOptions::builder()
//!         .page_size("A4")
//!         .margins("10mm")
//!         .title("Invoice #42")
//!         .build();
//!     let pdf = converter.generate_pdf("<h1>Invoice</h1>", &options).await?;
//!     std::fs::write("invoice.pdf", pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `html2pdf` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-html2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConverterConfig, ConverterConfigBuilder, ExtraOptions, MetadataFields, OptionValue,
    Orientation, PdfOptions, PdfOptionsBuilder, RenderOptions,
};
pub use convert::{generate_pdf_sync, Converter, VERSION};
pub use error::Html2PdfError;
pub use pipeline::args::build_args;
pub use pipeline::metadata::patch_metadata;
pub use server::{router, serve, AppState};

//! Conversion entry points.
//!
//! [`Converter`] holds the process-wide [`ConverterConfig`] and is built once
//! at startup. It is cheap to share behind an `Arc`: every method takes
//! `&self` and keeps no state between calls, so any number of conversions
//! can run at the same time.

use crate::config::{ConverterConfig, PdfOptions};
use crate::error::Html2PdfError;
use crate::pipeline::{args, execute, metadata};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Version of this crate, reported by [`Converter::version`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs `wkhtmltopdf` conversions and queries.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert an HTML string to PDF bytes.
    ///
    /// # Errors
    /// - [`Html2PdfError::InvalidSource`] — the source looks like a URL
    /// - [`Html2PdfError::Spawn`] — the renderer could not be started
    /// - [`Html2PdfError::Render`] — the renderer failed and produced no PDF
    /// - [`Html2PdfError::Timeout`] — the configured timeout expired
    ///
    /// # Example
    /// ```rust,no_run
    /// use edgequake_html2pdf::{Converter, PdfOptions};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let converter = Converter::default();
    /// let options = PdfOptions::builder().page_size("A4").title("Hi").build();
    /// let pdf = converter.generate_pdf("<h1>hi</h1>", &options).await?;
    /// assert!(pdf.starts_with(b"%PDF"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate_pdf(
        &self,
        source: &str,
        options: &PdfOptions,
    ) -> Result<Vec<u8>, Html2PdfError> {
        let start = Instant::now();
        info!("Starting conversion: {} bytes of HTML", source.len());

        let cmd_args = args::build_args(&options.render, &options.extra);
        debug!("Renderer arguments: {:?}", cmd_args);

        let pdf = execute::render(
            &self.config.binary,
            source,
            &cmd_args,
            self.config.timeout_secs,
        )
        .await?;

        let pdf = metadata::patch_metadata(pdf, &options.metadata);

        info!(
            "Conversion complete: {} bytes of PDF in {}ms",
            pdf.len(),
            start.elapsed().as_millis()
        );
        Ok(pdf)
    }

    /// Convert and write the PDF directly to a file.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    /// Returns the number of bytes written.
    pub async fn generate_pdf_to_file(
        &self,
        source: &str,
        output_path: impl AsRef<Path>,
        options: &PdfOptions,
    ) -> Result<usize, Html2PdfError> {
        let pdf = self.generate_pdf(source, options).await?;
        let path = output_path.as_ref();
        let write_err = |source| Html2PdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("pdf.tmp");
        tokio::fs::write(&tmp_path, &pdf).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

        Ok(pdf.len())
    }

    /// Version of this crate and of the renderer.
    ///
    /// Never fails: if the renderer cannot be queried the failure is
    /// described in place of its version.
    pub async fn version(&self) -> String {
        let wk_version = match self.query("-V").await {
            Ok(v) => v,
            Err(e) => format!("{}: {}", e.kind(), e),
        };
        format!("html2pdf version: {VERSION}\nwkhtmltopdf version: {wk_version}")
    }

    /// The renderer's short help text (`-h`).
    pub async fn help(&self) -> Result<String, Html2PdfError> {
        self.query("-h").await
    }

    /// The renderer's extended help text (`-H`).
    pub async fn extended_help(&self) -> Result<String, Html2PdfError> {
        self.query("-H").await
    }

    /// Run the renderer with a single flag and return its trimmed stdout.
    /// The exit status is ignored.
    async fn query(&self, flag: &str) -> Result<String, Html2PdfError> {
        let output = execute::run(
            &self.config.binary,
            &[flag.to_string()],
            None,
            self.config.timeout_secs,
        )
        .await?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .trim_matches(|c| c == ' ' || c == '\n')
            .to_string())
    }
}

/// Synchronous wrapper around [`Converter::generate_pdf`].
///
/// Creates a temporary tokio runtime internally; do not call it from inside
/// an async context.
pub fn generate_pdf_sync(
    converter: &Converter,
    source: &str,
    options: &PdfOptions,
) -> Result<Vec<u8>, Html2PdfError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Html2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(converter.generate_pdf(source, options))
}

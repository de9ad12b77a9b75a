//! Renderer execution: run `wkhtmltopdf` as a child process.
//!
//! The child is driven through `tokio::process`, so waiting on it is an
//! `.await` point and never stalls a runtime worker. Each call owns its own
//! child; nothing is shared between concurrent renders.
//!
//! stdin is written while stdout and stderr are drained, which keeps large
//! documents from deadlocking on a full pipe. The child is always reaped
//! before [`run`] returns, except on timeout, where it is killed on drop.
//!
//! ## Success policy
//!
//! `wkhtmltopdf` regularly exits non-zero after producing a perfectly good
//! document (a missing image, a failed font request). Its exit code is
//! therefore checked together with the payload:
//!
//! | exit status | stdout starts with `%PDF` | result                 |
//! |-------------|---------------------------|------------------------|
//! | success     | any                       | `Ok(stdout)`           |
//! | failure     | yes                       | `Ok(stdout)` + warning |
//! | failure     | no                        | `Err(Render)`          |
//!
//! A zero exit with empty output is a success.

use crate::error::Html2PdfError;
use crate::pipeline::source;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// The 4-byte signature every PDF starts with.
pub const PDF_SIGNATURE: &[u8; 4] = b"%PDF";

/// Check if `bytes` starts with the PDF signature.
pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}

/// Render `source` with the given arguments and return the raw PDF bytes.
///
/// Fails with [`Html2PdfError::InvalidSource`] before spawning anything when
/// the source looks like a URL.
pub async fn render(
    binary: &Path,
    source: &str,
    args: &[String],
    timeout_secs: Option<u64>,
) -> Result<Vec<u8>, Html2PdfError> {
    source::ensure_not_url(source)?;

    debug!("Running {} {:?}", binary.display(), args);
    let start = Instant::now();
    let output = run(binary, args, Some(source.as_bytes()), timeout_secs).await?;
    debug!(
        "Renderer finished in {}ms: status={}, {} bytes out, {} bytes err",
        start.elapsed().as_millis(),
        output.status,
        output.stdout.len(),
        output.stderr.len()
    );

    check_output(args, output)
}

/// Apply the success policy to a finished renderer invocation.
pub fn check_output(args: &[String], output: Output) -> Result<Vec<u8>, Html2PdfError> {
    if output.status.success() {
        return Ok(output.stdout);
    }

    if has_pdf_signature(&output.stdout) {
        warn!(
            "Renderer exited with {} but produced a PDF; keeping it. stderr: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Ok(output.stdout);
    }

    Err(Html2PdfError::Render {
        args: args.to_vec(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Spawn `binary` with `args`, optionally feed `input` on stdin, and collect
/// its output once it exits.
///
/// The exit status is not interpreted here.
pub async fn run(
    binary: &Path,
    args: &[String],
    input: Option<&[u8]>,
    timeout_secs: Option<u64>,
) -> Result<Output, Html2PdfError> {
    let mut command = Command::new(binary);
    command
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| Html2PdfError::Spawn {
        program: binary.to_path_buf(),
        source,
    })?;

    let stdin = child.stdin.take();
    let feed = async move {
        let (Some(mut pipe), Some(bytes)) = (stdin, input) else {
            return Ok(());
        };
        match pipe.write_all(bytes).await {
            // The renderer may exit before consuming its input; its exit
            // status and output decide the outcome.
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("Renderer closed stdin early");
                Ok(())
            }
            other => other,
        }
        // `pipe` dropped here: stdin closed, renderer sees EOF.
    };

    let finished = async {
        let (fed, output) = futures::future::join(feed, child.wait_with_output()).await;
        let output = output?;
        fed?;
        Ok::<Output, Html2PdfError>(output)
    };

    match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), finished)
            .await
            .map_err(|_| {
                warn!("Renderer exceeded {}s; killing it", secs);
                Html2PdfError::Timeout { secs }
            })?,
        None => finished.await,
    }
}

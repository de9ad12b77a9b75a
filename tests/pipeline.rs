//! Integration tests for the conversion pipeline against fake renderers.
//!
//! Each test writes a small `/bin/sh` script that stands in for
//! `wkhtmltopdf`, so the exit-status policy, stdin/stdout plumbing, metadata
//! patching, timeouts and concurrency are exercised without the real binary.
//!
//! Tests are `#[serial]`: executing a script another thread is still writing
//! can fail with `ETXTBSY`.

#![cfg(unix)]

use edgequake_html2pdf::{
    build_args, generate_pdf_sync, Converter, ConverterConfig, Html2PdfError, PdfOptions,
    VERSION,
};
use serial_test::serial;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A minimal document with the info block layout wkhtmltopdf emits.
const FAKE_PDF: &[u8] =
    b"%PDF-1.4\n1 0 obj\n<<\n/Title (old)\n/Creator (wkhtmltopdf 0.12.6)\n/Producer (Qt 4.8.7)\n>>\nendobj\n%%EOF\n";

/// `printf` program that prints [`FAKE_PDF`].
const PRINT_FAKE_PDF: &str = r"printf '%%PDF-1.4\n1 0 obj\n<<\n/Title (old)\n/Creator (wkhtmltopdf 0.12.6)\n/Producer (Qt 4.8.7)\n>>\nendobj\n%%%%EOF\n'";

/// Write an executable shell script named `wkhtmltopdf` into `dir`.
fn fake_renderer(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("wkhtmltopdf");
    std::fs::write(&path, format!("#!/bin/sh\nDIR=$(dirname \"$0\")\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn converter(binary: &Path) -> Converter {
    Converter::new(ConverterConfig::builder().binary(binary).build().unwrap())
}

fn converter_with_timeout(binary: &Path, secs: u64) -> Converter {
    Converter::new(
        ConverterConfig::builder()
            .binary(binary)
            .timeout_secs(secs)
            .build()
            .unwrap(),
    )
}

// ── Plumbing ─────────────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn html_goes_in_on_stdin_and_pdf_comes_out() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(
        &dir,
        &format!(
            "cat > \"$DIR/stdin.html\"\nprintf '%s\\n' \"$@\" > \"$DIR/args.txt\"\n{PRINT_FAKE_PDF}"
        ),
    );
    let options = PdfOptions::builder()
        .page_size("A4")
        .grayscale(true)
        .option("print-media-type", true)
        .build();
    let html = "<h1>héllo</h1>\n<p>world</p>";

    let pdf = converter(&bin).generate_pdf(html, &options).await.unwrap();
    assert_eq!(pdf, FAKE_PDF);

    let stdin = std::fs::read_to_string(dir.path().join("stdin.html")).unwrap();
    assert_eq!(stdin, html);

    let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(args, build_args(&options.render, &options.extra));
    assert_eq!(
        args,
        ["--grayscale", "--page-size", "A4", "--print-media-type", "-", "-"]
    );
}

#[tokio::test]
#[serial]
async fn large_document_does_not_deadlock() {
    let dir = TempDir::new().unwrap();
    // Echo stdin back with a PDF header: both pipes carry megabytes.
    let bin = fake_renderer(&dir, "printf '%%PDF-1.4\\n'\ncat");
    let html = "<p>lorem ipsum</p>\n".repeat(200_000);

    let pdf = converter(&bin)
        .generate_pdf(&html, &PdfOptions::default())
        .await
        .unwrap();
    assert_eq!(pdf.len(), "%PDF-1.4\n".len() + html.len());
}

#[tokio::test]
#[serial]
async fn renderer_closing_stdin_early_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, &format!("exec 0<&-\n{PRINT_FAKE_PDF}"));
    let html = "x".repeat(4 * 1024 * 1024);

    let pdf = converter(&bin)
        .generate_pdf(&html, &PdfOptions::default())
        .await
        .unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

// ── Success policy ───────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn nonzero_exit_with_pdf_output_is_success() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(
        &dir,
        &format!(
            "cat > /dev/null\n{PRINT_FAKE_PDF}\necho 'Exit with code 1 due to network error: ContentNotFoundError' >&2\nexit 1"
        ),
    );

    let pdf = converter(&bin)
        .generate_pdf("<img src=\"missing.png\">", &PdfOptions::default())
        .await
        .unwrap();
    assert_eq!(pdf, FAKE_PDF);
}

#[tokio::test]
#[serial]
async fn zero_exit_with_empty_output_is_success() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, "cat > /dev/null\nexit 0");

    let pdf = converter(&bin)
        .generate_pdf("<p>x</p>", &PdfOptions::default())
        .await
        .unwrap();
    assert!(pdf.is_empty());
}

#[tokio::test]
#[serial]
async fn failure_reports_arguments_and_trimmed_stderr() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(
        &dir,
        "cat > /dev/null\nprintf 'not a pdf'\nprintf '\\n  Unknown long argument --bogus\\n\\n' >&2\nexit 1",
    );
    let options = PdfOptions::builder().option("bogus", true).build();

    let err = converter(&bin)
        .generate_pdf("<p>x</p>", &options)
        .await
        .unwrap_err();
    match err {
        Html2PdfError::Render {
            ref args,
            ref stderr,
        } => {
            assert_eq!(args, &["--bogus", "-", "-"]);
            assert_eq!(stderr, "Unknown long argument --bogus");
        }
        other => panic!("expected Render, got {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.starts_with("error running wkhtmltopdf, command: "), "{msg}");
    assert!(msg.contains("--bogus"), "{msg}");
}

#[tokio::test]
#[serial]
async fn url_source_never_reaches_renderer() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, "touch \"$DIR/spawned\"\nexit 0");

    for source in ["http://example.com", "https://example.com", " www.example.com"] {
        let err = converter(&bin)
            .generate_pdf(source, &PdfOptions::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, Html2PdfError::InvalidSource { .. }),
            "{source}: {err:?}"
        );
    }
    assert!(!dir.path().join("spawned").exists());
}

// ── Metadata ─────────────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn metadata_is_written_into_the_document() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, &format!("cat > /dev/null\n{PRINT_FAKE_PDF}"));
    let options = PdfOptions::builder()
        .title("Quarterly report")
        .author("Billing")
        .build();

    let pdf = converter(&bin).generate_pdf("<p>x</p>", &options).await.unwrap();
    assert_eq!(
        pdf,
        b"%PDF-1.4\n1 0 obj\n<<\n/Title (Quarterly report)\n/Author (Billing)\n>>\nendobj\n%%EOF\n"
    );
}

#[tokio::test]
#[serial]
async fn no_metadata_leaves_document_untouched() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, &format!("cat > /dev/null\n{PRINT_FAKE_PDF}"));

    let pdf = converter(&bin)
        .generate_pdf("<p>x</p>", &PdfOptions::default())
        .await
        .unwrap();
    assert_eq!(pdf, FAKE_PDF);
}

// ── Timeouts and concurrency ─────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn slow_renderer_times_out() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, "exec sleep 5");

    let start = Instant::now();
    let err = converter_with_timeout(&bin, 1)
        .generate_pdf("<p>x</p>", &PdfOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Html2PdfError::Timeout { secs: 1 }), "{err:?}");
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn concurrent_renders_overlap() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, "cat > /dev/null\nsleep 1\nprintf '%%PDF-1.4'");
    let conv = converter(&bin);
    let options = PdfOptions::default();

    let start = Instant::now();
    let jobs = (0..4).map(|i| {
        let conv = &conv;
        let options = &options;
        async move { conv.generate_pdf(&format!("<p>{i}</p>"), options).await }
    });
    let results = futures::future::join_all(jobs).await;

    for r in results {
        assert_eq!(r.unwrap(), b"%PDF-1.4");
    }
    // Four one-second renders run serially would take four seconds.
    assert!(
        start.elapsed() < Duration::from_secs(3),
        "renders did not overlap: {:?}",
        start.elapsed()
    );
}

// ── Queries ──────────────────────────────────────────────────────────────────

const QUERY_SCRIPT: &str = r#"case "$1" in
  -V) printf ' wkhtmltopdf 0.12.6 (with patched qt) \n\n' ;;
  -h) printf 'Name:\n  wkhtmltopdf 0.12.6\n' ; exit 1 ;;
  -H) printf 'Name:\n  wkhtmltopdf 0.12.6\n\nExtended help\n' ;;
esac"#;

#[tokio::test]
#[serial]
async fn version_reports_both_versions() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, QUERY_SCRIPT);

    let v = converter(&bin).version().await;
    assert_eq!(
        v,
        format!("html2pdf version: {VERSION}\nwkhtmltopdf version: wkhtmltopdf 0.12.6 (with patched qt)")
    );
}

#[tokio::test]
#[serial]
async fn help_texts_ignore_exit_status() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, QUERY_SCRIPT);
    let conv = converter(&bin);

    assert_eq!(conv.help().await.unwrap(), "Name:\n  wkhtmltopdf 0.12.6");
    assert_eq!(
        conv.extended_help().await.unwrap(),
        "Name:\n  wkhtmltopdf 0.12.6\n\nExtended help"
    );
}

// ── Output helpers ───────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn pdf_to_file_writes_atomically() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, &format!("cat > /dev/null\n{PRINT_FAKE_PDF}"));
    let out = dir.path().join("out/nested/doc.pdf");

    let written = converter(&bin)
        .generate_pdf_to_file("<p>x</p>", &out, &PdfOptions::default())
        .await
        .unwrap();

    assert_eq!(written, FAKE_PDF.len());
    assert_eq!(std::fs::read(&out).unwrap(), FAKE_PDF);
    assert!(!out.with_extension("pdf.tmp").exists());
}

#[tokio::test]
#[serial]
async fn pdf_to_file_does_not_create_output_on_failure() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, "cat > /dev/null\necho boom >&2\nexit 2");
    let out = dir.path().join("doc.pdf");

    let err = converter(&bin)
        .generate_pdf_to_file("<p>x</p>", &out, &PdfOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Html2PdfError::Render { .. }));
    assert!(!out.exists());
}

#[test]
#[serial]
fn sync_wrapper_renders() {
    let dir = TempDir::new().unwrap();
    let bin = fake_renderer(&dir, &format!("cat > /dev/null\n{PRINT_FAKE_PDF}"));

    let pdf = generate_pdf_sync(&converter(&bin), "<p>x</p>", &PdfOptions::default()).unwrap();
    assert_eq!(pdf, FAKE_PDF);
}

//! CLI binary for edgequake-html2pdf.
//!
//! A thin shim over the library crate: maps CLI flags to `ConverterConfig`
//! and `PdfOptions`, then either serves HTTP, converts one document, or
//! queries the renderer.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_html2pdf::server::{DEFAULT_BODY_LIMIT, DEFAULT_PORT};
use edgequake_html2pdf::{
    serve, AppState, Converter, ConverterConfig, OptionValue, Orientation, PdfOptions,
};
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service on port 8000
  html2pdf serve --port 8000
  curl -d '<h1>this is html</h1>' http://localhost:8000/generate.pdf > created.pdf

  # Convert a file
  html2pdf render page.html -o page.pdf

  # Convert stdin to stdout, A4 landscape, grayscale, with a title
  cat page.html | html2pdf render --page-size A4 --orientation landscape \
      --grayscale --title "Report" > report.pdf

  # Pass any other wkhtmltopdf option
  html2pdf render page.html -o page.pdf --set print-media-type --set javascript-delay=500

  # Load options from a JSON file
  html2pdf serve --options options.json

  # Show versions / the renderer's own option reference
  html2pdf version
  html2pdf renderer-help --extended

OPTIONS FILE (JSON):
  {
    "render":   { "page_size": "A4", "grayscale": true, "margin_top": "10mm" },
    "extra":    { "print_media_type": true, "javascript_delay": 200 },
    "metadata": { "title": "Report", "author": "Billing" }
  }

ENVIRONMENT VARIABLES:
  WKHTMLTOPDF_PATH        Renderer binary (default: wkhtmltopdf on PATH)
  HTML2PDF_TIMEOUT        Per-render timeout in seconds (default: none)
  HTML2PDF_OPTIONS        Options file applied to every conversion
  HOST / PORT             Listen address for `serve` (default 0.0.0.0:80)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Convert HTML to PDF with wkhtmltopdf.
#[derive(Parser, Debug)]
#[command(
    name = "html2pdf",
    version,
    about = "Convert HTML to PDF with wkhtmltopdf — CLI and HTTP service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the wkhtmltopdf binary.
    #[arg(long, global = true, env = "WKHTMLTOPDF_PATH")]
    binary: Option<PathBuf>,

    /// Per-render timeout in seconds. Unset: wait indefinitely.
    #[arg(long, global = true, env = "HTML2PDF_TIMEOUT")]
    timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "HTML2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "HTML2PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP conversion service.
    Serve(ServeArgs),
    /// Convert one HTML document (file or stdin) to PDF.
    Render(RenderArgs),
    /// Print this tool's and the renderer's versions.
    Version,
    /// Print the renderer's help text.
    RendererHelp {
        /// Print the extended help (-H) instead of the short one (-h).
        #[arg(long)]
        extended: bool,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Largest accepted request body in bytes.
    #[arg(long, env = "HTML2PDF_MAX_BODY_BYTES", default_value_t = DEFAULT_BODY_LIMIT)]
    max_body_bytes: usize,

    #[command(flatten)]
    options: OptionArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// HTML file to convert. Reads stdin when omitted or `-`.
    input: Option<PathBuf>,

    /// Write the PDF to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    options: OptionArgs,
}

#[derive(Args, Debug)]
struct OptionArgs {
    /// JSON file with default options; flags below override it.
    #[arg(long = "options", env = "HTML2PDF_OPTIONS", value_name = "FILE")]
    options_file: Option<PathBuf>,

    /// Web cache directory.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Generate the PDF in grayscale.
    #[arg(long)]
    grayscale: bool,

    /// Generate a lower quality, smaller PDF.
    #[arg(long)]
    lowquality: bool,

    /// Set all four page margins, e.g. 10mm.
    #[arg(long)]
    margins: Option<String>,

    #[arg(long)]
    margin_bottom: Option<String>,

    #[arg(long)]
    margin_left: Option<String>,

    #[arg(long)]
    margin_right: Option<String>,

    #[arg(long)]
    margin_top: Option<String>,

    /// Page orientation.
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    #[arg(long)]
    page_height: Option<String>,

    #[arg(long)]
    page_width: Option<String>,

    /// Paper size: A4, Letter, …
    #[arg(long)]
    page_size: Option<String>,

    /// Maximum DPI for embedded images.
    #[arg(long)]
    image_dpi: Option<u32>,

    /// JPEG quality for embedded images.
    #[arg(long)]
    image_quality: Option<u32>,

    /// Any other wkhtmltopdf option: NAME (flag) or NAME=VALUE. Repeatable.
    #[arg(long = "set", value_name = "NAME[=VALUE]")]
    set: Vec<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    author: Option<String>,

    #[arg(long)]
    subject: Option<String>,

    #[arg(long)]
    creator: Option<String>,

    #[arg(long)]
    producer: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let converter = Converter::new(build_converter_config(&cli)?);

    match cli.command {
        Command::Serve(ref args) => {
            let options = build_options(&args.options).await?;
            let addr = SocketAddr::new(args.host, args.port);
            let state = AppState::new(converter, options).with_body_limit(args.max_body_bytes);
            serve(addr, state).await.context("Server failed")?;
        }
        Command::Render(ref args) => {
            let options = build_options(&args.options).await?;
            let source = read_source(args.input.as_ref()).await?;
            render(&converter, &source, args.output.as_ref(), &options, cli.quiet).await?;
        }
        Command::Version => {
            println!("{}", converter.version().await);
        }
        Command::RendererHelp { extended } => {
            let text = if extended {
                converter.extended_help().await
            } else {
                converter.help().await
            }
            .context("Failed to query wkhtmltopdf")?;
            println!("{text}");
        }
    }

    Ok(())
}

/// Map global CLI args to `ConverterConfig`.
fn build_converter_config(cli: &Cli) -> Result<ConverterConfig> {
    let mut builder = ConverterConfig::builder();
    if let Some(ref binary) = cli.binary {
        builder = builder.binary(binary);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    builder.build().context("Invalid configuration")
}

/// Map option flags (on top of the optional options file) to `PdfOptions`.
async fn build_options(args: &OptionArgs) -> Result<PdfOptions> {
    let mut options = match args.options_file {
        Some(ref path) => PdfOptions::from_file(path)
            .await
            .with_context(|| format!("Failed to load options from {:?}", path))?,
        None => PdfOptions::default(),
    };

    let r = &mut options.render;
    if let Some(ref dir) = args.cache_dir {
        r.cache_dir = Some(dir.clone());
    }
    if args.grayscale {
        r.grayscale = Some(true);
    }
    if args.lowquality {
        r.lowquality = Some(true);
    }
    if let Some(ref m) = args.margins {
        r.margin_bottom = Some(m.clone());
        r.margin_left = Some(m.clone());
        r.margin_right = Some(m.clone());
        r.margin_top = Some(m.clone());
    }
    let margins = [
        (&args.margin_bottom, &mut r.margin_bottom),
        (&args.margin_left, &mut r.margin_left),
        (&args.margin_right, &mut r.margin_right),
        (&args.margin_top, &mut r.margin_top),
    ];
    for (flag, field) in margins {
        if let Some(v) = flag {
            *field = Some(v.clone());
        }
    }
    if let Some(ref o) = args.orientation {
        r.orientation = Some(o.clone().into());
    }
    if let Some(ref h) = args.page_height {
        r.page_height = Some(h.clone());
    }
    if let Some(ref w) = args.page_width {
        r.page_width = Some(w.clone());
    }
    if let Some(ref s) = args.page_size {
        r.page_size = Some(s.clone());
    }
    if let Some(dpi) = args.image_dpi {
        r.image_dpi = Some(dpi);
    }
    if let Some(q) = args.image_quality {
        r.image_quality = Some(q);
    }

    for raw in &args.set {
        let (name, value) = parse_set(raw)?;
        options.extra.set(name, value);
    }

    let m = &mut options.metadata;
    let fields = [
        (&args.title, &mut m.title),
        (&args.author, &mut m.author),
        (&args.subject, &mut m.subject),
        (&args.creator, &mut m.creator),
        (&args.producer, &mut m.producer),
    ];
    for (flag, field) in fields {
        if let Some(v) = flag {
            *field = Some(v.clone());
        }
    }

    Ok(options)
}

/// Parse `--set NAME[=VALUE]`. A bare name is a flag.
fn parse_set(raw: &str) -> Result<(String, OptionValue)> {
    let (name, value) = match raw.split_once('=') {
        Some((name, value)) => (name.trim(), OptionValue::parse_loose(value)),
        None => (raw.trim(), OptionValue::Bool(true)),
    };
    let name = name.trim_start_matches('-');
    if name.is_empty() {
        anyhow::bail!("Invalid --set '{}': option name is empty", raw);
    }
    Ok((name.to_string(), value))
}

/// Read the HTML source from a file, or stdin for `None` / `-`.
async fn read_source(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path)),
        _ => {
            let mut source = String::new();
            tokio::io::stdin()
                .read_to_string(&mut source)
                .await
                .context("Failed to read HTML from stdin")?;
            Ok(source)
        }
    }
}

async fn render(
    converter: &Converter,
    source: &str,
    output: Option<&PathBuf>,
    options: &PdfOptions,
    quiet: bool,
) -> Result<()> {
    match output {
        Some(path) => {
            let written = converter
                .generate_pdf_to_file(source, path, options)
                .await
                .context("Conversion failed")?;
            if !quiet {
                eprintln!(
                    "{}  {} bytes  →  {}",
                    green("✔"),
                    written,
                    bold(&path.display().to_string())
                );
            }
        }
        None => {
            let pdf = converter
                .generate_pdf(source, options)
                .await
                .context("Conversion failed")?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&pdf)
                .context("Failed to write to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

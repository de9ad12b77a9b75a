//! Configuration types for HTML-to-PDF conversion.
//!
//! Two layers of configuration exist:
//!
//! * [`ConverterConfig`] — process-wide and immutable: where the
//!   `wkhtmltopdf` binary lives and how long a single render may take. Built
//!   once at startup via [`ConverterConfigBuilder`] and handed to
//!   [`crate::convert::Converter`].
//! * [`PdfOptions`] — per conversion: the typed [`RenderOptions`], the
//!   free-form [`ExtraOptions`] and the [`MetadataFields`] patched into the
//!   produced document.

use crate::error::Html2PdfError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable that overrides the renderer binary location.
pub const BINARY_ENV_VAR: &str = "WKHTMLTOPDF_PATH";

/// Binary name looked up on `PATH` when [`BINARY_ENV_VAR`] is not set.
pub const DEFAULT_BINARY: &str = "wkhtmltopdf";

// ── Converter configuration ──────────────────────────────────────────────

/// Process-wide settings for the external renderer.
///
/// # Example
/// ```rust
/// use edgequake_html2pdf::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .binary("/usr/local/bin/wkhtmltopdf")
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, Some(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Path (or bare name resolved on `PATH`) of the `wkhtmltopdf` binary.
    /// Default: `$WKHTMLTOPDF_PATH`, else `wkhtmltopdf`.
    pub binary: PathBuf,

    /// Upper bound for a single renderer invocation in seconds. Default: none.
    ///
    /// Without a timeout a hung renderer hangs the request that started it
    /// (and only that request). When set, the child is killed on expiry and
    /// the conversion fails with [`Html2PdfError::Timeout`].
    pub timeout_secs: Option<u64>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        let binary = std::env::var_os(BINARY_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY));
        Self {
            binary,
            timeout_secs: None,
        }
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.binary = path.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn no_timeout(mut self) -> Self {
        self.config.timeout_secs = None;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, Html2PdfError> {
        let c = &self.config;
        if c.binary.as_os_str().is_empty() {
            return Err(Html2PdfError::InvalidConfig(
                "Renderer binary path must not be empty".into(),
            ));
        }
        if c.timeout_secs == Some(0) {
            return Err(Html2PdfError::InvalidConfig(
                "Timeout must be ≥ 1 second (omit it to disable)".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Option values ────────────────────────────────────────────────────────

/// Value of a renderer option.
///
/// `Bool(true)` becomes a bare flag, `Bool(false)` is omitted, everything
/// else becomes a flag followed by the value's string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    /// Parse a command-line style value: `true`/`false`, an integer, or text.
    pub fn parse_loose(s: &str) -> Self {
        match s {
            "true" => OptionValue::Bool(true),
            "false" => OptionValue::Bool(false),
            _ => s
                .parse::<i64>()
                .map(OptionValue::Int)
                .unwrap_or_else(|_| OptionValue::Text(s.to_string())),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(n) => write!(f, "{n}"),
            OptionValue::Float(x) => write_float(f, *x),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

/// Float string form: always a decimal point for integral values (`1.0`),
/// shortest round-trip digits otherwise (`1.25`), exponent notation outside
/// `1e-4 ..= 1e16` (`1e-05`, `1e+16`).
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("nan");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "inf" } else { "-inf" });
    }
    let abs = x.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let sci = format!("{x:e}");
        let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        let (sign, digits) = match exp.strip_prefix('-') {
            Some(d) => ('-', d),
            None => ('+', exp),
        };
        return write!(f, "{mantissa}e{sign}{digits:0>2}");
    }
    if x.fract() == 0.0 {
        write!(f, "{x:.1}")
    } else {
        write!(f, "{x}")
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Float(v)
    }
}

impl From<u32> for OptionValue {
    fn from(v: u32) -> Self {
        OptionValue::Int(i64::from(v))
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Text(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Text(v)
    }
}

// ── Typed render options ─────────────────────────────────────────────────

/// Page orientation passed as `--orientation <Portrait|Landscape>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("Portrait"),
            Orientation::Landscape => f.write_str("Landscape"),
        }
    }
}

impl FromStr for Orientation {
    type Err = Html2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(Html2PdfError::InvalidConfig(format!(
                "Unknown orientation '{other}' (expected Portrait or Landscape)"
            ))),
        }
    }
}

/// The renderer options modelled explicitly.
///
/// Every field is optional. For the two boolean switches `None` means "no
/// opinion" and `Some(false)` means "disabled"; both leave the flag off the
/// command line. Values are passed through unvalidated, `wkhtmltopdf` is the
/// judge of what it accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Web cache directory (`--cache-dir`).
    pub cache_dir: Option<PathBuf>,
    /// PDF generated in grayscale (`--grayscale`).
    pub grayscale: Option<bool>,
    /// Lower-quality, smaller output (`--lowquality`).
    pub lowquality: Option<bool>,
    /// e.g. `10mm`.
    pub margin_bottom: Option<String>,
    pub margin_left: Option<String>,
    pub margin_right: Option<String>,
    pub margin_top: Option<String>,
    pub orientation: Option<Orientation>,
    /// e.g. `297mm`.
    pub page_height: Option<String>,
    pub page_width: Option<String>,
    /// Paper size name: `A4`, `Letter`, …
    pub page_size: Option<String>,
    /// Maximum DPI for embedded images (renderer default 600).
    pub image_dpi: Option<u32>,
    /// JPEG quality for embedded images (renderer default 94).
    pub image_quality: Option<u32>,
}

// ── Extra options ────────────────────────────────────────────────────────

/// Ordered, free-form renderer options not modelled by [`RenderOptions`].
///
/// Entries keep their insertion order. Setting a name that is already present
/// replaces its value in place. Names compare with `-` and `_` treated as
/// equal, so `"print-media-type"` and `"print_media_type"` are the same key.
/// An entry holding `None` is an explicit unset: it overrides a typed field
/// without emitting anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraOptions {
    entries: Vec<(String, Option<OptionValue>)>,
}

/// Canonical option key: underscores, no leading dashes.
pub(crate) fn normalise_key(name: &str) -> String {
    name.trim_start_matches('-').replace('-', "_")
}

impl ExtraOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any previous value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> &mut Self {
        self.put(name.into(), Some(value.into()));
        self
    }

    /// Mark `name` as explicitly unset.
    pub fn unset(&mut self, name: impl Into<String>) -> &mut Self {
        self.put(name.into(), None);
        self
    }

    /// Chaining form of [`ExtraOptions::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    fn put(&mut self, name: String, value: Option<OptionValue>) {
        let key = normalise_key(&name);
        match self.entries.iter_mut().find(|(k, _)| normalise_key(k) == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up an entry. `Some(None)` is an explicit unset.
    pub fn get(&self, name: &str) -> Option<Option<&OptionValue>> {
        let key = normalise_key(name);
        self.entries
            .iter()
            .find(|(k, _)| normalise_key(k) == key)
            .map(|(_, v)| v.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&OptionValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ExtraOptions
where
    K: Into<String>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut extra = ExtraOptions::new();
        for (k, v) in iter {
            extra.set(k, v);
        }
        extra
    }
}

impl Serialize for ExtraOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExtraOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ExtraVisitor;

        impl<'de> Visitor<'de> for ExtraVisitor {
            type Value = ExtraOptions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of option name to bool, number, string or null")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut extra = ExtraOptions::new();
                while let Some((name, value)) =
                    access.next_entry::<String, Option<OptionValue>>()?
                {
                    extra.put(name, value);
                }
                Ok(extra)
            }
        }

        deserializer.deserialize_map(ExtraVisitor)
    }
}

// ── Metadata ─────────────────────────────────────────────────────────────

/// Document information fields written into the produced PDF.
///
/// Empty strings are treated the same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}

impl MetadataFields {
    /// The set fields in their fixed output order: Title, Author, Subject,
    /// Creator, Producer.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ]
        .into_iter()
        .filter_map(|(name, v)| match v.as_deref() {
            Some(s) if !s.is_empty() => Some((name, s)),
            _ => None,
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

// ── Per-conversion bundle ────────────────────────────────────────────────

/// Everything that describes one conversion besides the source itself.
///
/// # Example
/// ```rust
/// use edgequake_html2pdf::{Orientation, PdfOptions};
///
/// let opts = PdfOptions::builder()
///     .page_size("A4")
///     .orientation(Orientation::Landscape)
///     .grayscale(true)
///     .option("print-media-type", true)
///     .title("Quarterly report")
///     .build();
/// assert_eq!(opts.metadata.title.as_deref(), Some("Quarterly report"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    pub render: RenderOptions,
    pub extra: ExtraOptions,
    pub metadata: MetadataFields,
}

impl PdfOptions {
    pub fn builder() -> PdfOptionsBuilder {
        PdfOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Parse options from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, Html2PdfError> {
        serde_json::from_str(json)
            .map_err(|e| Html2PdfError::InvalidConfig(format!("options JSON: {e}")))
    }

    /// Load options from a JSON file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, Html2PdfError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            Html2PdfError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }
}

/// Builder for [`PdfOptions`].
#[derive(Debug)]
pub struct PdfOptionsBuilder {
    options: PdfOptions,
}

impl PdfOptionsBuilder {
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.render.cache_dir = Some(dir.into());
        self
    }

    pub fn grayscale(mut self, v: bool) -> Self {
        self.options.render.grayscale = Some(v);
        self
    }

    pub fn lowquality(mut self, v: bool) -> Self {
        self.options.render.lowquality = Some(v);
        self
    }

    /// Set all four margins at once.
    pub fn margins(mut self, margin: impl Into<String>) -> Self {
        let m = margin.into();
        let r = &mut self.options.render;
        r.margin_bottom = Some(m.clone());
        r.margin_left = Some(m.clone());
        r.margin_right = Some(m.clone());
        r.margin_top = Some(m);
        self
    }

    pub fn margin_bottom(mut self, m: impl Into<String>) -> Self {
        self.options.render.margin_bottom = Some(m.into());
        self
    }

    pub fn margin_left(mut self, m: impl Into<String>) -> Self {
        self.options.render.margin_left = Some(m.into());
        self
    }

    pub fn margin_right(mut self, m: impl Into<String>) -> Self {
        self.options.render.margin_right = Some(m.into());
        self
    }

    pub fn margin_top(mut self, m: impl Into<String>) -> Self {
        self.options.render.margin_top = Some(m.into());
        self
    }

    pub fn orientation(mut self, o: Orientation) -> Self {
        self.options.render.orientation = Some(o);
        self
    }

    pub fn page_height(mut self, h: impl Into<String>) -> Self {
        self.options.render.page_height = Some(h.into());
        self
    }

    pub fn page_width(mut self, w: impl Into<String>) -> Self {
        self.options.render.page_width = Some(w.into());
        self
    }

    pub fn page_size(mut self, size: impl Into<String>) -> Self {
        self.options.render.page_size = Some(size.into());
        self
    }

    pub fn image_dpi(mut self, dpi: u32) -> Self {
        self.options.render.image_dpi = Some(dpi);
        self
    }

    pub fn image_quality(mut self, q: u32) -> Self {
        self.options.render.image_quality = Some(q);
        self
    }

    /// Add a free-form renderer option.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.extra.set(name, value);
        self
    }

    pub fn extra(mut self, extra: ExtraOptions) -> Self {
        self.options.extra = extra;
        self
    }

    pub fn title(mut self, v: impl Into<String>) -> Self {
        self.options.metadata.title = Some(v.into());
        self
    }

    pub fn author(mut self, v: impl Into<String>) -> Self {
        self.options.metadata.author = Some(v.into());
        self
    }

    pub fn subject(mut self, v: impl Into<String>) -> Self {
        self.options.metadata.subject = Some(v.into());
        self
    }

    pub fn creator(mut self, v: impl Into<String>) -> Self {
        self.options.metadata.creator = Some(v.into());
        self
    }

    pub fn producer(mut self, v: impl Into<String>) -> Self {
        self.options.metadata.producer = Some(v.into());
        self
    }

    pub fn build(self) -> PdfOptions {
        self.options
    }
}

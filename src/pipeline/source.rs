//! Source validation: refuse anything that looks like a URL.
//!
//! Only inline HTML is converted. A source whose first non-whitespace
//! characters are `http` or `www` is rejected before a renderer process is
//! started. The check is a plain prefix test, not URL parsing:
//! `"httpbin"` is rejected too.

use crate::error::Html2PdfError;

const URL_PREFIXES: [&str; 2] = ["http", "www"];

/// The URL-like prefix `source` starts with, if any.
pub fn url_prefix(source: &str) -> Option<&'static str> {
    let trimmed = source.trim_start();
    URL_PREFIXES
        .iter()
        .copied()
        .find(|prefix| trimmed.starts_with(prefix))
}

/// Check if the source looks like a URL.
pub fn is_url(source: &str) -> bool {
    url_prefix(source).is_some()
}

/// Return `Err(InvalidSource)` when `source` looks like a URL.
pub fn ensure_not_url(source: &str) -> Result<(), Html2PdfError> {
    match url_prefix(source) {
        Some(prefix) => Err(Html2PdfError::InvalidSource {
            prefix: prefix.to_string(),
        }),
        None => Ok(()),
    }
}

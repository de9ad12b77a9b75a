//! Metadata patching: rewrite the document information block in place.
//!
//! `wkhtmltopdf` (Qt backend) serialises the info dictionary as three
//! consecutive lines near the trailer:
//!
//! ```text
//! /Title (…)
//! /Creator (wkhtmltopdf 0.12.6)
//! /Producer (Qt 4.8.7)
//! ```
//!
//! The first such span is replaced by a block built from
//! [`MetadataFields`]. This is a byte-level text substitution, not a PDF
//! edit: xref offsets are not updated (PDF readers tolerate this) and the
//! values are written verbatim between parentheses.
//!
//! Known fragility: the match depends on the renderer's exact serialisation.
//! If a future renderer writes the dictionary differently the pattern stops
//! matching and the document is returned unchanged, never corrupted.

use crate::config::MetadataFields;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::{debug, warn};

/// `/Title` line, one line in between, `/Producer` line. `(?-u)` lets `.`
/// match arbitrary bytes (titles are often UTF-16BE).
static RE_INFO_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)/Title.*\n.*\n/Producer.*").unwrap());

/// Build the replacement block, one `/<Name> (<value>)` line per set field.
///
/// Returns `None` when no field is set.
pub fn metadata_block(fields: &MetadataFields) -> Option<String> {
    let lines: Vec<String> = fields
        .entries()
        .into_iter()
        .map(|(name, value)| format!("/{name} ({value})"))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Replace the first `/Title … /Producer` span of `pdf` with `fields`.
///
/// Returns `pdf` untouched (same allocation) when no field is set or the
/// span cannot be found.
pub fn patch_metadata(mut pdf: Vec<u8>, fields: &MetadataFields) -> Vec<u8> {
    let Some(block) = metadata_block(fields) else {
        return pdf;
    };

    let range = match RE_INFO_SPAN.find(&pdf) {
        Some(m) => m.range(),
        None => {
            warn!("No /Title…/Producer block found in renderer output; metadata not applied");
            return pdf;
        }
    };

    debug!(
        "Patching metadata at bytes {}..{} ({} → {} bytes)",
        range.start,
        range.end,
        range.len(),
        block.len()
    );
    pdf.splice(range, block.into_bytes());
    pdf
}

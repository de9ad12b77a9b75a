//! Argument marshalling: [`RenderOptions`] + [`ExtraOptions`] → CLI tokens.
//!
//! Pure and deterministic. The typed fields come first in declaration order,
//! extras are merged on top (an extra naming an existing field replaces its
//! value at the field's position, new names are appended in insertion order).
//!
//! | value             | tokens              |
//! |-------------------|---------------------|
//! | absent / `false`  | none                |
//! | `true`            | `--name`            |
//! | anything else     | `--name`, `value`   |
//!
//! The list always ends with `-` `-`: read HTML from stdin, write PDF to
//! stdout.

use crate::config::{normalise_key, ExtraOptions, OptionValue, RenderOptions};

/// Positional tokens telling `wkhtmltopdf` to use stdin and stdout.
pub const STDIO_ARGS: [&str; 2] = ["-", "-"];

/// Build the ordered `wkhtmltopdf` argument list.
pub fn build_args(options: &RenderOptions, extras: &ExtraOptions) -> Vec<String> {
    let mut merged = base_entries(options);

    for (name, value) in extras.iter() {
        let key = normalise_key(name);
        let value = value.cloned();
        match merged.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => merged.push((key, value)),
        }
    }

    let mut args = Vec::with_capacity(merged.len() * 2 + STDIO_ARGS.len());
    for (name, value) in merged {
        let flag = format!("--{}", name.replace('_', "-"));
        match value {
            None | Some(OptionValue::Bool(false)) => {}
            Some(OptionValue::Bool(true)) => args.push(flag),
            Some(other) => {
                args.push(flag);
                args.push(other.to_string());
            }
        }
    }

    args.extend(STDIO_ARGS.iter().map(|s| s.to_string()));
    args
}

/// Typed fields in declaration order, keyed by their canonical name.
fn base_entries(o: &RenderOptions) -> Vec<(String, Option<OptionValue>)> {
    let text = |v: &Option<String>| v.clone().map(OptionValue::Text);
    let int = |v: Option<u32>| v.map(OptionValue::from);

    vec![
        (
            "cache_dir".into(),
            o.cache_dir
                .as_ref()
                .map(|p| OptionValue::Text(p.display().to_string())),
        ),
        ("grayscale".into(), o.grayscale.map(OptionValue::Bool)),
        ("lowquality".into(), o.lowquality.map(OptionValue::Bool)),
        ("margin_bottom".into(), text(&o.margin_bottom)),
        ("margin_left".into(), text(&o.margin_left)),
        ("margin_right".into(), text(&o.margin_right)),
        ("margin_top".into(), text(&o.margin_top)),
        (
            "orientation".into(),
            o.orientation.map(|v| OptionValue::Text(v.to_string())),
        ),
        ("page_height".into(), text(&o.page_height)),
        ("page_width".into(), text(&o.page_width)),
        ("page_size".into(), text(&o.page_size)),
        ("image_dpi".into(), int(o.image_dpi)),
        ("image_quality".into(), int(o.image_quality)),
    ]
}

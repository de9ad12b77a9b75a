//! Pipeline stages for HTML-to-PDF conversion.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ args ──▶ execute ──▶ metadata
//! (guard)   (tokens)  (wkhtmltopdf) (info patch)
//! ```
//!
//! 1. [`source`]   — reject sources that look like URLs
//! 2. [`args`]     — typed + extra options to an ordered token list
//! 3. [`execute`]  — spawn the renderer, pipe HTML in and PDF out, apply the
//!    exit-code/signature success policy; the only stage that awaits
//! 4. [`metadata`] — byte-level rewrite of the `/Title … /Producer` block

pub mod args;
pub mod execute;
pub mod metadata;
pub mod source;

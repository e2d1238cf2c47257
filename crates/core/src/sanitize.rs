//! Sanitization of donor-supplied annotations.
//!
//! The annotation is the only free text that crosses from the public into
//! the payment session and, later, onto the overlay. Rules are applied in
//! order: collapse whitespace, replace links, truncate.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum annotation length in characters (Unicode scalar values).
pub const MAX_ANNOTATION_CHARS: usize = 240;

/// Replacement for any `http://` or `https://` token.
pub const LINK_PLACEHOLDER: &str = "[link]";

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid regex"));

/// Apply the annotation policy to untrusted input.
///
/// Idempotent: `sanitize_annotation(&sanitize_annotation(x)) ==
/// sanitize_annotation(x)`.
pub fn sanitize_annotation(raw: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(raw, " ");
    let delinked = LINK_RE.replace_all(&collapsed, LINK_PLACEHOLDER);
    delinked.chars().take(MAX_ANNOTATION_CHARS).collect()
}

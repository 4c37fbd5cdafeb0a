//! Filesystem-safe name handling for attachment files and contribution folders.
//!
//! Sanitization is idempotent: feeding an already-sanitized name back in
//! yields the same name. Collisions are resolved deterministically with a
//! counter suffix.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum filename length before word-boundary truncation kicks in.
pub const MAX_FILENAME_LEN: usize = 180;

static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\r\n]"#).expect("valid regex"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Convert a name to a filesystem-safe form, truncating at
/// [`MAX_FILENAME_LEN`].
pub fn safe_filename(name: &str) -> String {
    safe_filename_with_limit(name, MAX_FILENAME_LEN)
}

/// Convert a name to a filesystem-safe form with an explicit length bound.
///
/// Path-invalid characters become `_`, whitespace runs collapse to a single
/// space, and leading/trailing spaces, dots and underscores are trimmed.
/// Names over the bound are cut at a word boundary. Empty results become
/// `unknown`.
pub fn safe_filename_with_limit(name: &str, max_len: usize) -> String {
    let replaced = INVALID_CHARS.replace_all(name, "_");
    let collapsed = WHITESPACE_RUNS.replace_all(&replaced, " ");
    let mut result = trim_edges(&collapsed).to_string();

    if result.chars().count() > max_len {
        result = result.chars().take(max_len).collect();
        // Drop the trailing (possibly cut) word when there is one to drop.
        if let Some(idx) = result.rfind(' ') {
            result.truncate(idx);
        }
        // Re-trim so truncation cannot expose a trailing dot or underscore,
        // which would break idempotency.
        result = trim_edges(&result).to_string();
    }

    if result.is_empty() {
        "unknown".to_string()
    } else {
        result
    }
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c: char| c == ' ' || c == '.' || c == '_')
}

/// Append a counter suffix before the file extension: `report.pdf` with
/// `n = 2` becomes `report_2.pdf`.
pub fn with_counter_suffix(name: &str, n: u32) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => format!("{}_{n}{}", &name[..idx], &name[idx..]),
        _ => format!("{name}_{n}"),
    }
}

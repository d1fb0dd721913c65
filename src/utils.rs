//! Utility functions for text cleanup, logging, and file system operations.
//!
//! This module provides helper functions used throughout the pipeline:
//! - Whitespace normalization and bounded truncation for extracted content
//! - String truncation for logging
//! - File system validation for the output directory

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace into single spaces and trim the ends.
///
/// Extracted article text arrives full of layout whitespace (newlines,
/// tabs, indentation). The classifier downstream only cares about prose, so
/// everything is normalized to single spaces.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("a  b\n\n c"), "a b c");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUNS.replace_all(s.trim(), " ").into_owned()
}

/// Truncate content to `max` characters, appending `...` when cut.
///
/// Keeps extracted article bodies bounded so a single long page cannot
/// dominate the output artifact. Operates on characters, not bytes, so the
/// cut never lands inside a multi-byte sequence.
pub fn truncate_content(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut truncated: String = s.chars().take(max).collect();
        truncated.push_str("...");
        truncated
    }
}

/// Number of whitespace-separated words in `s`.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and byte
/// count indicator appended. Only used for log lines, so the cut is done on
/// the raw byte prefix.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

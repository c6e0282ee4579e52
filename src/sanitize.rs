//! Filesystem-safe names derived from remote text
//!
//! Titles and file names come straight from the remote catalog, so they are
//! reduced to an explicit allow-list before they touch the filesystem. Nothing
//! is escaped or substituted: disallowed characters are dropped.

use std::path::PathBuf;

/// Punctuation kept in addition to ASCII letters and digits
const ALLOWED_PUNCTUATION: &[char] = &['-', '_', '.', '(', ')', ' '];

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || ALLOWED_PUNCTUATION.contains(&c)
}

/// Filters one segment and rejects dot-only names such as `.` and `..`
fn clean_segment(raw: &str) -> String {
    let filtered: String = raw
        .replace('&', "and")
        .chars()
        .filter(|c| is_allowed(*c))
        .collect();
    let trimmed = filtered.trim();

    if trimmed.chars().all(|c| c == '.') {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Sanitizes text into a single path segment
///
/// `&` becomes `and`, then only ASCII letters, digits and `-_.() ` survive.
/// Path separators are always dropped, so the result can never name a parent
/// or nested directory. An input with no allowed characters yields an empty
/// string, which callers must treat as an error.
///
/// # Examples
///
/// ```
/// use catalog_grabber::sanitize_segment;
///
/// assert_eq!(sanitize_segment("Tom & Jerry (Part 1)"), "Tom and Jerry (Part 1)");
/// assert_eq!(sanitize_segment("../../etc/passwd"), "....etcpasswd");
/// assert_eq!(sanitize_segment("日本語"), "");
/// ```
pub fn sanitize_segment(text: &str) -> String {
    clean_segment(text)
}

/// Sanitizes text into a relative multi-segment path
///
/// Behaves like [`sanitize_segment`] but keeps `/` as a separator. Empty and
/// dot-only segments are removed, so the result is always relative and never
/// walks upwards. An empty `PathBuf` means nothing usable was left.
///
/// # Examples
///
/// ```
/// use catalog_grabber::sanitize_path;
/// use std::path::PathBuf;
///
/// assert_eq!(sanitize_path("/Studio/../Title"), PathBuf::from("Studio/Title"));
/// ```
pub fn sanitize_path(text: &str) -> PathBuf {
    text.split('/')
        .map(clean_segment)
        .filter(|segment| !segment.is_empty())
        .collect()
}

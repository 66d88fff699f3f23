//! Filename sanitization
//!
//! Turns arbitrary book titles into names that are valid path components on
//! Linux, macOS and Windows.

/// Name used when nothing usable survives sanitization
pub const FALLBACK_FILENAME: &str = "untitled";

/// Longest file stem we produce, in bytes (leaves room for an extension)
const MAX_STEM_BYTES: usize = 200;

/// Device names Windows refuses as file stems
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

fn is_illegal(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control()
}

/// Sanitizes a title for use as a file stem
///
/// Illegal characters are removed, runs of whitespace are collapsed, and
/// leading/trailing dots and spaces are stripped. Reserved device names get a
/// trailing underscore. The result is never empty.
///
/// # Examples
///
/// ```
/// use tululu_scraper::storage::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Book: Part/1?"), "Book Part1");
/// assert_eq!(sanitize_filename("///"), "untitled");
/// ```
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title.chars().filter(|c| !is_illegal(*c)).collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c == ' ');

    let mut name = truncate_to_boundary(trimmed, MAX_STEM_BYTES)
        .trim_end_matches(|c: char| c == '.' || c == ' ')
        .to_string();

    if name.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    if RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(&name))
    {
        name.push('_');
    }

    name
}

/// Cuts `s` to at most `max` bytes without splitting a character
fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

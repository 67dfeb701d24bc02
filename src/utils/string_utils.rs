//! UTF-8-safe string truncation utilities
//!
//! Scraped text regularly contains multi-byte characters (accented Spanish
//! names, typographic quotes), so every length cap goes through these
//! helpers instead of byte slicing.

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// # Examples
/// ```
/// # use institute_scrape::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Sevilla", 3), "Sev");
/// assert_eq!(safe_truncate_chars("Investigación", 12), "Investigació");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Truncate to `max_chars` characters and append `...` when anything was cut.
///
/// ```
/// # use institute_scrape::utils::string_utils::truncate_with_ellipsis;
/// assert_eq!(truncate_with_ellipsis("abcdef", 3), "abc...");
/// assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
/// ```
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let cut = safe_truncate_chars(s, max_chars);
    if cut.len() == s.len() {
        s.to_string()
    } else {
        format!("{cut}...")
    }
}

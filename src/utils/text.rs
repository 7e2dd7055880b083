//! Text utilities for safe UTF-8 string handling.

/// Safely truncate a UTF-8 string to at most `max_bytes` bytes at a char boundary.
///
/// Test case titles come from import files in any language, so truncating for
/// display must never slice in the middle of a multi-byte character.
///
/// # Example
///
/// ```
/// use witkit::utils::truncate_str;
///
/// assert_eq!(truncate_str("Hello, World!", 5), "Hello");
/// assert_eq!(truncate_str("Hi", 10), "Hi");
///
/// let title = "Girişte hata gösterilir";
/// let truncated = truncate_str(title, 10);
/// assert!(truncated.len() <= 10);
/// assert!(truncated.is_char_boundary(truncated.len()));
/// ```
#[inline]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    // Find the largest char boundary <= max_bytes
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

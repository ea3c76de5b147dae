//! Upload filename sanitization.

use unicode_normalization::UnicodeNormalization;

/// Reduce an uploaded filename to a safe, flat ASCII name.
///
/// - Only the last path component is kept (browsers on Windows may send
///   `C:\Users\...\photo.png`).
/// - Accents are decomposed and the remaining non-ASCII characters dropped.
/// - Whitespace runs become `_`; anything outside `[A-Za-z0-9_.-]` is removed.
/// - Leading and trailing `.` and `_` are stripped, so the result can never
///   be `.`, `..` or a dot-file.
///
/// Returns `None` when nothing usable remains.
///
/// # Examples
///
/// ```
/// use arquivista::file::secure_filename;
///
/// assert_eq!(secure_filename("My cool movie.mov").as_deref(), Some("My_cool_movie.mov"));
/// assert_eq!(secure_filename("../../../etc/passwd").as_deref(), Some("passwd"));
/// assert_eq!(secure_filename("..").as_deref(), None);
/// ```
pub fn secure_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let ascii: String = last.nfkd().filter(char::is_ascii).collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

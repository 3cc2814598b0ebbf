//! Portable filename sanitization and truncation.

use crate::error::ValidationError;
use crate::model::require_non_blank;

/// Default cap on filename length, in characters.
pub const DEFAULT_MAX_FILE_NAME_LEN: usize = 220;
/// Largest accepted cap.
pub const MAX_FILE_NAME_LEN_LIMIT: usize = 250;
/// Byte ceiling for a single path component. Common filesystems stop at 255;
/// the rest is headroom for a ` (n)` collision counter.
pub const MAX_FILE_NAME_BYTES: usize = 240;

fn is_invalid(c: char) -> bool {
    c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
}

/// Replaces each run of characters that are invalid in filenames with a
/// single `_`. A trailing run of dots, together with any invalid characters
/// right before it, also becomes one `_`.
///
/// - `a/b\\c.txt` → `a_b_c.txt`
/// - `title?..` → `title_`
pub fn make_valid_file_name(name: &str) -> Result<String, ValidationError> {
    require_non_blank(name, "file name")?;

    let mut head = name;
    let mut trailing = false;
    let without_dots = head.trim_end_matches('.');
    if without_dots.len() != head.len() {
        head = without_dots.trim_end_matches(is_invalid);
        trailing = true;
    }

    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in head.chars() {
        if is_invalid(c) {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    if trailing {
        out.push('_');
    }
    Ok(out)
}

/// Splits `name` into stem and extension (with its dot). A leading dot or a
/// trailing dot does not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Longest prefix of `s` within both `max_chars` characters and `max_bytes`
/// bytes, never splitting a character.
fn take_within(s: &str, max_chars: usize, max_bytes: usize) -> &str {
    let mut end = 0;
    for (count, (idx, c)) in s.char_indices().enumerate() {
        if count >= max_chars || idx + c.len_utf8() > max_bytes {
            break;
        }
        end = idx + c.len_utf8();
    }
    &s[..end]
}

/// Truncates `name` to at most `max_len` characters, keeping the extension.
/// Names are also held under [`MAX_FILE_NAME_BYTES`] so wide scripts stay
/// within filesystem component limits.
pub fn truncate_file_name(name: &str, max_len: usize) -> Result<String, ValidationError> {
    require_non_blank(name, "file name")?;
    if !(1..=MAX_FILE_NAME_LEN_LIMIT).contains(&max_len) {
        return Err(ValidationError::OutOfRange {
            field: "max_file_name_len",
            value: max_len,
            min: 1,
            max: MAX_FILE_NAME_LEN_LIMIT,
        });
    }
    if name.chars().count() <= max_len && name.len() <= MAX_FILE_NAME_BYTES {
        return Ok(name.to_string());
    }

    let (stem, extension) = split_extension(name);
    let ext_len = extension.chars().count();
    if ext_len >= max_len || extension.len() >= MAX_FILE_NAME_BYTES {
        return Ok(take_within(name, max_len, MAX_FILE_NAME_BYTES).to_string());
    }
    let mut out =
        take_within(stem, max_len - ext_len, MAX_FILE_NAME_BYTES - extension.len()).to_string();
    out.push_str(extension);
    Ok(out)
}

/// Valid characters first, then length.
pub fn create_safe_file_name(name: &str, max_len: usize) -> Result<String, ValidationError> {
    let valid = make_valid_file_name(name)?;
    truncate_file_name(&valid, max_len)
}

/// `stem (n).ext` for the n-th collision.
pub(super) fn numbered(name: &str, n: u32) -> String {
    let (stem, extension) = split_extension(name);
    format!("{stem} ({n}){extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_invalid_runs() {
        assert_eq!(make_valid_file_name("a/b\\c.txt").unwrap(), "a_b_c.txt");
        assert_eq!(make_valid_file_name("what?*now.mp4").unwrap(), "what_now.mp4");
        assert_eq!(make_valid_file_name("tab\there").unwrap(), "tab_here");
    }

    #[test]
    fn trailing_dots_become_underscore() {
        assert_eq!(make_valid_file_name("title...").unwrap(), "title_");
        assert_eq!(make_valid_file_name("title?..").unwrap(), "title_");
        assert_eq!(make_valid_file_name("a?.?.").unwrap(), "a_._");
    }

    #[test]
    fn inner_dots_are_kept() {
        assert_eq!(make_valid_file_name("v1.2 final.mp4").unwrap(), "v1.2 final.mp4");
    }

    #[test]
    fn blank_rejected() {
        assert_eq!(
            make_valid_file_name("  "),
            Err(ValidationError::Blank("file name"))
        );
    }

    #[test]
    fn truncate_keeps_extension() {
        let name = format!("{}.mp4", "x".repeat(300));
        let out = truncate_file_name(&name, DEFAULT_MAX_FILE_NAME_LEN).unwrap();
        assert_eq!(out.chars().count(), DEFAULT_MAX_FILE_NAME_LEN);
        assert!(out.ends_with(".mp4"));
    }

    #[test]
    fn truncate_short_name_unchanged() {
        assert_eq!(truncate_file_name("clip.webm", 220).unwrap(), "clip.webm");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let name = format!("{}.mp3", "é".repeat(20));
        let out = truncate_file_name(&name, 10).unwrap();
        assert_eq!(out, format!("{}.mp3", "é".repeat(6)));
    }

    #[test]
    fn truncate_caps_bytes_for_wide_scripts() {
        let name = format!("{}.mp4", "字".repeat(200));
        let out = truncate_file_name(&name, DEFAULT_MAX_FILE_NAME_LEN).unwrap();
        assert!(out.len() <= MAX_FILE_NAME_BYTES, "{} bytes", out.len());
        assert!(out.ends_with(".mp4"));
        assert_eq!(out.chars().count(), (MAX_FILE_NAME_BYTES - 4) / 3 + 4);
    }

    #[test]
    fn truncate_limit_validated() {
        assert!(matches!(
            truncate_file_name("a.mp4", 251),
            Err(ValidationError::OutOfRange { value: 251, .. })
        ));
        assert!(truncate_file_name("a.mp4", 0).is_err());
        assert!(truncate_file_name("a.mp4", 250).is_ok());
    }

    #[test]
    fn numbered_inserts_before_extension() {
        assert_eq!(numbered("video.mp4", 1), "video (1).mp4");
        assert_eq!(numbered("README", 2), "README (2)");
    }
}

//! Chapter file reading

use crate::encoding::{decode_text, DecodedText};
use crate::{FsError, Result};
use std::fs;
use std::path::Path;

/// Read a file and recover its text
///
/// Only filesystem failures are errors; undecodable content falls back to
/// a lossy UTF-8 decoding.
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<DecodedText> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| FsError::from_io(path, e))?;

    let decoded = decode_text(&bytes);
    tracing::debug!(
        "Read {} ({} bytes) as {}{}",
        path.display(),
        bytes.len(),
        decoded.encoding,
        if decoded.fallback { " (fallback)" } else { "" }
    );
    Ok(decoded)
}

/// Collapse `\r\n` and bare `\r` into `\n`
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// First `max_chars` Unicode scalar values of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Read a file as preview text: decoded, normalized and truncated
pub fn read_preview<P: AsRef<Path>>(path: P, preview_length: usize) -> Result<String> {
    let decoded = read_text(path)?;
    let normalized = normalize_line_endings(&decoded.text);
    Ok(truncate_chars(&normalized, preview_length).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextEncoding;

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "a\nb\nc\nd");
        assert_eq!(normalize_line_endings("\r\r\n"), "\n\n");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("第一章开始", 3), "第一章");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_read_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ch1.txt");
        fs::write(&path, "第一章\r\n少年出山。\r\n").unwrap();

        let decoded = read_text(&path).unwrap();
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
        assert_eq!(normalize_line_endings(&decoded.text), "第一章\n少年出山。\n");
    }

    #[test]
    fn test_read_gb2312_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ch2.txt");
        let (bytes, _, _) = encoding_rs::GBK.encode("第二章 下山\n他背着剑，一路向南。");
        fs::write(&path, &bytes).unwrap();

        let preview = read_preview(&path, 1500).unwrap();
        assert_eq!(preview, "第二章 下山\n他背着剑，一路向南。");
    }

    #[test]
    fn test_preview_truncates_normalized_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.txt");
        let body: String = "abcdefghij".repeat(300);
        fs::write(&path, &body).unwrap();

        let preview = read_preview(&path, 1500).unwrap();
        assert_eq!(preview.chars().count(), 1500);
        assert_eq!(preview, &body[..1500]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_text(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));
    }

    #[test]
    fn test_reading_directory_fails_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_text(dir.path()).unwrap_err();
        assert!(!matches!(err, FsError::NotFound(_)));
    }
}

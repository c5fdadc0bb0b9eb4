//! Character encoding detection and recovery
//!
//! Chapter files arrive without any declared encoding. Each candidate
//! encoding is tried in a fixed order and the first decoding that looks
//! like prose wins.

use encoding_rs::Encoding;

/// Share of CJK ideographs below which CJK-bearing text is suspicious
const MIN_CHINESE_RATIO: f64 = 0.05;

/// Share of printable characters below which text is considered noise
const MIN_PRINTABLE_RATIO: f64 = 0.6;

/// Candidate encodings, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// Simplified Chinese legacy encoding (decoded as its GBK superset)
    Gb2312,
    Utf16Le,
}

impl TextEncoding {
    /// Trial order used by [`decode_text`]
    pub const PRIORITY: [TextEncoding; 3] = [
        TextEncoding::Utf8,
        TextEncoding::Gb2312,
        TextEncoding::Utf16Le,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Gb2312 => "gb2312",
            TextEncoding::Utf16Le => "utf-16le",
        }
    }

    fn encoding(&self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => encoding_rs::UTF_8,
            TextEncoding::Gb2312 => encoding_rs::GBK,
            TextEncoding::Utf16Le => encoding_rs::UTF_16LE,
        }
    }

    /// Decode bytes, replacing malformed sequences with U+FFFD
    ///
    /// UTF-8 input is decoded as is, so a leading BOM survives as U+FEFF.
    /// A UTF-16LE byte order mark is stripped.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, had_errors) = match self {
            TextEncoding::Utf8 => self.encoding().decode_without_bom_handling(bytes),
            _ => self.encoding().decode_with_bom_removal(bytes),
        };
        if had_errors {
            tracing::trace!("Malformed sequences while decoding as {}", self.label());
        }
        text.into_owned()
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Text recovered from raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
    /// Every candidate looked garbled; `text` is the UTF-8 decoding
    pub fallback: bool,
}

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4E00}'..='\u{9FA5}').contains(&c)
}

fn is_printable(c: char) -> bool {
    is_cjk_ideograph(c)
        || c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || c == '\u{FEFF}'
        || matches!(
            c,
            ',' | '.' | '!' | '?' | '"' | '\'' | '-'
                | '，' | '。' | '！' | '？' | '、' | '：' | '；'
                | '（' | '）' | '《' | '》'
        )
}

/// Replacement character or a C0 control other than TAB, LF and CR
fn is_noise(c: char) -> bool {
    c == '\u{FFFD}'
        || matches!(c, '\u{0000}'..='\u{0008}' | '\u{000B}'..='\u{000C}' | '\u{000E}'..='\u{001F}')
}

/// Decide whether decoded text looks like decoding noise rather than prose
pub fn is_garbled(text: &str) -> bool {
    let mut total = 0usize;
    let mut chinese = 0usize;
    let mut printable = 0usize;
    let mut noisy = false;

    for c in text.chars() {
        total += 1;
        if is_cjk_ideograph(c) {
            chinese += 1;
        }
        if is_printable(c) {
            printable += 1;
        }
        noisy |= is_noise(c);
    }

    if total == 0 {
        return true;
    }

    let printable_ratio = printable as f64 / total as f64;

    if chinese > 0 {
        let chinese_ratio = chinese as f64 / total as f64;
        (chinese_ratio < MIN_CHINESE_RATIO && printable_ratio < MIN_PRINTABLE_RATIO) || noisy
    } else {
        printable_ratio < MIN_PRINTABLE_RATIO || noisy
    }
}

/// Decode bytes by trying each candidate encoding in priority order
///
/// Never fails: when every candidate looks garbled the UTF-8 decoding is
/// returned with `fallback` set.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    for encoding in TextEncoding::PRIORITY {
        let text = encoding.decode(bytes);
        if !is_garbled(&text) {
            return DecodedText {
                text,
                encoding,
                fallback: false,
            };
        }
        tracing::debug!("Decoding as {} looks garbled", encoding);
    }

    tracing::warn!("All candidate encodings look garbled, falling back to utf-8");
    DecodedText {
        text: TextEncoding::Utf8.decode(bytes),
        encoding: TextEncoding::Utf8,
        fallback: true,
    }
}

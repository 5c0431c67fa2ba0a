//! Binary-content detection and text cleaning
//!
//! Runs before chunking so the model budget is not spent on encoded or
//! binary noise.

use regex::Regex;
use std::sync::LazyLock;

/// Characters inspected by the density heuristic
const SAMPLE_CHARS: usize = 4096;

/// Identical characters in a row before a run is collapsed
const REPEAT_RUN_MIN: usize = 10;

/// Copies kept of a collapsed run
const REPEAT_RUN_KEEP: usize = 3;

/// Marker replacing long unbroken encoded tokens
pub const REDACTION_MARKER: &str = "[encoded content removed]";

/// Leading signatures of common binary formats, as they appear after lossy
/// UTF-8 or Latin-1 decoding
const BINARY_SIGNATURES: [(&str, &str); 16] = [
    ("%PDF-", "PDF document"),
    ("PK\u{3}\u{4}", "ZIP archive or Office document"),
    ("\u{FFFD}PNG", "PNG image"),
    ("\u{89}PNG", "PNG image"),
    ("GIF87a", "GIF image"),
    ("GIF89a", "GIF image"),
    ("\u{FF}\u{D8}\u{FF}", "JPEG image"),
    ("\u{FFFD}\u{FFFD}\u{FFFD}", "JPEG image"),
    ("\u{7F}ELF", "ELF executable"),
    ("MZ\u{90}\u{0}", "Windows executable"),
    ("MZ\u{FFFD}\u{0}", "Windows executable"),
    ("\u{1F}\u{8B}", "gzip archive"),
    ("\u{1F}\u{FFFD}", "gzip archive"),
    ("7z\u{BC}\u{AF}", "7z archive"),
    ("7z\u{FFFD}\u{FFFD}", "7z archive"),
    ("Rar!\u{1A}\u{7}", "RAR archive"),
];

/// Unbroken printable ASCII, the alphabet of base64, hex and URL encodings.
/// Scripts written without spaces never match.
static LONG_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[!-~]{100,}").expect("valid long token regex"));

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid whitespace regex"));

static TRAILING_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("valid trailing whitespace regex"));

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

/// Explain why `text` looks binary, or `None` if it looks like text
///
/// `threshold` is the tolerated share of control or replacement characters
/// in the leading sample.
pub fn detect_binary(text: &str, threshold: f64) -> Option<String> {
    if let Some((_, kind)) = BINARY_SIGNATURES
        .iter()
        .find(|(signature, _)| text.starts_with(signature))
    {
        return Some(format!("{} signature detected", kind));
    }

    if text.contains('\0') {
        return Some("NUL characters present".to_string());
    }

    let (sampled, suspicious) = text
        .chars()
        .take(SAMPLE_CHARS)
        .fold((0usize, 0usize), |(n, bad), c| {
            (n + 1, bad + usize::from(is_suspicious(c)))
        });

    if sampled == 0 {
        return None;
    }

    let density = suspicious as f64 / sampled as f64;
    (density > threshold).then(|| {
        format!(
            "{:.0}% control or undecodable characters",
            density * 100.0
        )
    })
}

fn is_suspicious(c: char) -> bool {
    c == '\u{FFFD}' || (c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\u{C}'))
}

/// Clean text before chunking
///
/// Normalizes line endings, strips control characters other than newline
/// and tab, collapses runs of repeated characters, redacts long unbroken
/// ASCII tokens and tidies whitespace.
pub fn clean_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let stripped: String = normalized
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect();

    let collapsed = collapse_repeats(&stripped);
    let redacted = LONG_TOKEN.replace_all(&collapsed, REDACTION_MARKER);
    let spaced = HORIZONTAL_WS.replace_all(&redacted, " ");
    let trimmed_lines = TRAILING_WS.replace_all(&spaced, "");
    let paragraphs = EXCESS_NEWLINES.replace_all(&trimmed_lines, "\n\n");

    paragraphs.trim().to_string()
}

/// Collapse runs of one non-whitespace character
fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let mut run = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }
        let keep = if run >= REPEAT_RUN_MIN && !c.is_whitespace() {
            REPEAT_RUN_KEEP
        } else {
            run
        };
        out.extend(std::iter::repeat_n(c, keep));
    }

    out
}

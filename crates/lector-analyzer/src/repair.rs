//! Pull a JSON object out of model text and repair common malformations
//!
//! Models wrap JSON in prose and code fences, or emit near-valid JSON
//! (single quotes, typographic quotes, trailing commas, over-escaped
//! quotes). Extraction takes the widest `{...}` region; repair is an
//! ordered chain of pure steps applied only when a direct parse fails.
//! Nothing here fabricates data: when both stages fail the caller gets
//! `None` and keeps the raw text.

use lector_domain::StructuredData;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// A repair step: `Some(new_text)` when it changed something, `None` otherwise
pub type RepairStep = fn(&str) -> Option<String>;

/// Repair steps in the order they are applied
pub const REPAIR_CHAIN: [(&str, RepairStep); 5] = [
    ("strip_code_fences", strip_code_fences),
    ("normalize_typographic_quotes", normalize_typographic_quotes),
    ("single_to_double_quotes", single_to_double_quotes),
    ("collapse_double_escapes", collapse_double_escapes),
    ("strip_trailing_commas", strip_trailing_commas),
];

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\s*```[A-Za-z0-9_+-]*").expect("valid opening fence regex"));

static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```\s*\z").expect("valid closing fence regex"));

static OUTERMOST_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));

/// A JSON object recovered from model text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    /// The object
    pub data: StructuredData,
    /// Whether repair was needed
    pub repaired: bool,
}

/// Slice from the first `{` to the last `}` inclusive
pub fn extract(model_text: &str) -> Option<&str> {
    let first = model_text.find('{')?;
    let last = model_text.rfind('}')?;
    (first < last).then(|| &model_text[first..=last])
}

/// Strict parse requiring a top-level object
pub fn parse_object(candidate: &str) -> Option<StructuredData> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Run the repair chain over `candidate` and try to parse the result
pub fn repair(candidate: &str) -> Option<StructuredData> {
    let repaired = REPAIR_CHAIN
        .iter()
        .fold(candidate.to_string(), |text, (_, step)| step(&text).unwrap_or(text));

    parse_object(&repaired).or_else(|| {
        OUTERMOST_OBJECT
            .find(&repaired)
            .and_then(|m| parse_object(m.as_str()))
    })
}

/// Extract, parse, and if needed repair a JSON object from model text
pub fn extract_and_parse(model_text: &str) -> Option<ParsedResponse> {
    let candidate = extract(model_text).unwrap_or(model_text);

    if let Some(data) = parse_object(candidate) {
        return Some(ParsedResponse { data, repaired: false });
    }

    repair(candidate).map(|data| ParsedResponse { data, repaired: true })
}

/// Remove a Markdown code fence wrapping the whole text
///
/// Fences elsewhere belong to string values and are kept.
pub fn strip_code_fences(text: &str) -> Option<String> {
    let opened = OPENING_FENCE.replace(text, "");
    let stripped = CLOSING_FENCE.replace(&opened, "");
    (stripped.len() != text.len()).then(|| stripped.into_owned())
}

/// Replace typographic quotes with their ASCII forms
pub fn normalize_typographic_quotes(text: &str) -> Option<String> {
    let is_typographic = |c: char| matches!(c, '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2018}' | '\u{2019}');
    if !text.chars().any(is_typographic) {
        return None;
    }
    Some(
        text.chars()
            .map(|c| match c {
                '\u{201C}' | '\u{201D}' | '\u{201E}' => '"',
                '\u{2018}' | '\u{2019}' => '\'',
                other => other,
            })
            .collect(),
    )
}

#[derive(Clone, Copy, PartialEq)]
enum QuoteState {
    Outside,
    InDouble,
    InSingle,
}

/// Turn single-quoted strings into double-quoted ones
///
/// Apostrophes inside existing double-quoted strings are left alone;
/// double quotes inside converted strings are escaped.
pub fn single_to_double_quotes(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len() + 8);
    let mut state = QuoteState::Outside;
    let mut changed = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (state, c) {
            (QuoteState::Outside, '"') => {
                state = QuoteState::InDouble;
                out.push(c);
            }
            (QuoteState::Outside, '\'') => {
                state = QuoteState::InSingle;
                changed = true;
                out.push('"');
            }
            (QuoteState::InDouble, '\\') => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            (QuoteState::InDouble, '"') => {
                state = QuoteState::Outside;
                out.push(c);
            }
            (QuoteState::InSingle, '\\') => match chars.next() {
                // \' is not a JSON escape
                Some('\'') => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            (QuoteState::InSingle, '"') => out.push_str("\\\""),
            (QuoteState::InSingle, '\'') => {
                state = QuoteState::Outside;
                out.push('"');
            }
            _ => out.push(c),
        }
    }

    changed.then_some(out)
}

/// Undo one level of quote escaping
///
/// A whole object emitted as an escaped string (`{\"a\": 1}`) is unescaped;
/// otherwise over-escaped quotes inside strings (`\\\"`) become `\"`.
pub fn collapse_double_escapes(text: &str) -> Option<String> {
    let trimmed = text.trim_start();
    if trimmed.starts_with("{\\\"") {
        return Some(trimmed.replace("\\\"", "\"").replace("\\\\", "\\"));
    }
    text.contains("\\\\\\\"")
        .then(|| text.replace("\\\\\\\"", "\\\""))
}

/// Drop commas that directly precede a closing `}` or `]`
pub fn strip_trailing_commas(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut changed = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next_significant = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if matches!(next_significant, Some('}') | Some(']')) {
                changed = true;
            } else {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }

    changed.then_some(out)
}

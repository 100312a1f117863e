//! Catalog codes and classification of input lines.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

use crate::search::is_magnet;

/// 2-5 letters, optional separator, 2-5 digits, optional trailing letter.
static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2,5}[- ]?[0-9]{2,5}[A-Za-z]?$").unwrap());

/// What one line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InputKind {
    Magnet(String),
    Code(String),
    Unrecognized(String),
}

impl InputKind {
    pub fn raw(&self) -> &str {
        match self {
            InputKind::Magnet(s) | InputKind::Code(s) | InputKind::Unrecognized(s) => s,
        }
    }
}

pub fn is_catalog_code(input: &str) -> bool {
    CODE_PATTERN.is_match(input)
}

/// Classify one trimmed line.
pub fn classify_input(line: &str) -> InputKind {
    let line = line.trim();
    if is_magnet(line) {
        InputKind::Magnet(line.to_string())
    } else if is_catalog_code(line) {
        InputKind::Code(line.to_string())
    } else {
        InputKind::Unrecognized(line.to_string())
    }
}

/// Non-empty trimmed lines of a message, each classified.
pub fn classify_lines(text: &str) -> Vec<InputKind> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(classify_input)
        .collect()
}

/// Comparison form: ASCII alphanumerics only, lowercased.
pub fn normalize_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

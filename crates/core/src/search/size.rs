//! Human-readable size strings ("5.40GB", "700 MB").

use once_cell::sync::Lazy;
use regex_lite::Regex;
use thiserror::Error;

static SIZE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)?)\s*([KMGTPE]?B)$").unwrap());

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SizeParseError {
    #[error("unrecognised size: {0:?}")]
    Unrecognised(String),

    #[error("size out of range: {0:?}")]
    OutOfRange(String),
}

/// Parse `<number><unit>` into bytes using base-1024 multipliers, rounding
/// down. An empty string is zero bytes.
pub fn parse_size(raw: &str) -> Result<u64, SizeParseError> {
    let normalized = raw.trim().to_uppercase();
    if normalized.is_empty() {
        return Ok(0);
    }

    let caps = SIZE_PATTERN
        .captures(&normalized)
        .ok_or_else(|| SizeParseError::Unrecognised(raw.to_string()))?;

    let number: f64 = caps[1]
        .parse()
        .map_err(|_| SizeParseError::Unrecognised(raw.to_string()))?;
    let exponent = match &caps[2] {
        "B" => 0,
        "KB" => 1,
        "MB" => 2,
        "GB" => 3,
        "TB" => 4,
        "PB" => 5,
        "EB" => 6,
        _ => return Err(SizeParseError::Unrecognised(raw.to_string())),
    };

    let bytes = (number * 1024f64.powi(exponent)).floor();
    if !bytes.is_finite() || bytes >= u64::MAX as f64 {
        return Err(SizeParseError::OutOfRange(raw.to_string()));
    }
    Ok(bytes as u64)
}

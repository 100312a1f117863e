//! Strict decoding of search result records.
//!
//! A record is a bracketed list of quoted strings:
//! `['magnet:?xt=...', 'NAME-123 FHD', '5.40GB', '2024-03-01']`.
//! Both JSON arrays and single-quoted list literals are accepted. Anything
//! else is rejected; nothing in a record is ever evaluated.

use chrono::NaiveDate;

use super::size::parse_size;
use super::{CandidateEntry, RecordError};

const MAGNET_PREFIX: &str = "magnet:?";

/// Decode one raw record into a candidate.
///
/// Field order is `[magnet, name, size, date, ..]`. Extra fields are ignored.
/// An unparsable date becomes `None`; an unparsable size rejects the record.
pub fn decode_record(raw: &str) -> Result<CandidateEntry, RecordError> {
    let fields = decode_fields(raw)?;
    if fields.len() < 4 {
        return Err(RecordError::TooFewFields {
            found: fields.len(),
        });
    }

    let magnet_uri = fields[0].trim();
    if !is_magnet(magnet_uri) {
        return Err(RecordError::MissingMagnet);
    }

    let size_bytes = parse_size(&fields[2])?;
    let upload_date = NaiveDate::parse_from_str(fields[3].trim(), "%Y-%m-%d").ok();

    Ok(CandidateEntry {
        magnet_uri: magnet_uri.to_string(),
        display_name: fields[1].trim().to_string(),
        size_bytes,
        upload_date,
    })
}

/// Whether `input` is a magnet URI.
pub fn is_magnet(input: &str) -> bool {
    input.len() > MAGNET_PREFIX.len()
        && input
            .get(..MAGNET_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MAGNET_PREFIX))
}

fn decode_fields(raw: &str) -> Result<Vec<String>, RecordError> {
    let raw = raw.trim();
    if !(raw.starts_with('[') && raw.ends_with(']')) {
        return Err(RecordError::Malformed("expected a bracketed list".into()));
    }

    if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        return values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => Ok(s),
                other => Err(RecordError::Malformed(format!(
                    "expected string field, found {}",
                    other
                ))),
            })
            .collect();
    }

    ListLiteral::new(&raw[1..raw.len() - 1]).parse()
}

/// Parser for the inside of a list literal of quoted strings.
struct ListLiteral<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> ListLiteral<'a> {
    fn new(body: &'a str) -> Self {
        Self {
            chars: body.chars().peekable(),
        }
    }

    fn parse(mut self) -> Result<Vec<String>, RecordError> {
        let mut fields = Vec::new();
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                None => break,
                Some('\'') | Some('"') => fields.push(self.quoted()?),
                Some(c) => {
                    return Err(RecordError::Malformed(format!(
                        "unexpected character {:?}",
                        c
                    )))
                }
            }

            self.skip_whitespace();
            match self.chars.next() {
                None => break,
                Some(',') => continue,
                Some(c) => {
                    return Err(RecordError::Malformed(format!(
                        "expected ',' but found {:?}",
                        c
                    )))
                }
            }
        }
        Ok(fields)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn quoted(&mut self) -> Result<String, RecordError> {
        let quote = self
            .chars
            .next()
            .ok_or_else(|| RecordError::Malformed("missing opening quote".into()))?;
        let mut out = String::new();

        loop {
            match self.chars.next() {
                None => return Err(RecordError::Malformed("unterminated string".into())),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => {
                        return Err(RecordError::Malformed("unterminated escape".into()))
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SizeParseError;

    const MAGNET: &str = "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn test_decode_single_quoted_literal() {
        let raw = format!("['{}', 'SONE-622 FHD', '5.40GB', '2024-03-01']", MAGNET);
        let entry = decode_record(&raw).unwrap();
        assert_eq!(entry.magnet_uri, MAGNET);
        assert_eq!(entry.display_name, "SONE-622 FHD");
        assert_eq!(entry.size_bytes, 5_798_205_849);
        assert_eq!(entry.upload_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_decode_json_array() {
        let raw = format!(r#"["{}", "name", "1.25MB", "2023-12-31", "extra"]"#, MAGNET);
        let entry = decode_record(&raw).unwrap();
        assert_eq!(entry.size_bytes, 1_310_720);
        assert_eq!(entry.upload_date, NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn test_decode_escapes_and_mixed_quotes() {
        let raw = format!(r#"['{}', "it's \"quoted\"", '', 'n/a',]"#, MAGNET);
        let entry = decode_record(&raw).unwrap();
        assert_eq!(entry.display_name, "it's \"quoted\"");
        assert_eq!(entry.size_bytes, 0);
        assert_eq!(entry.upload_date, None);
    }

    #[test]
    fn test_unknown_date_is_kept() {
        let raw = format!("['{}', 'x', '1GB', '03/01/2024']", MAGNET);
        assert_eq!(decode_record(&raw).unwrap().upload_date, None);
    }

    #[test]
    fn test_rejects_non_magnet() {
        let raw = "['http://example.com/a.torrent', 'x', '1GB', '2024-01-01']";
        assert_eq!(decode_record(raw), Err(RecordError::MissingMagnet));
    }

    #[test]
    fn test_rejects_too_few_fields() {
        let raw = format!("['{}', 'x', '1GB']", MAGNET);
        assert_eq!(
            decode_record(&raw),
            Err(RecordError::TooFewFields { found: 3 })
        );
    }

    #[test]
    fn test_rejects_invalid_size() {
        let raw = format!("['{}', 'x', 'huge', '2024-01-01']", MAGNET);
        assert!(matches!(
            decode_record(&raw),
            Err(RecordError::InvalidSize(SizeParseError::Unrecognised(_)))
        ));
    }

    #[test]
    fn test_rejects_code_like_input() {
        for raw in [
            "__import__('os').system('true')",
            "[os.system('true'), 'x', '1GB', '2024-01-01']",
            "['a' + 'b', 'x', '1GB', '2024-01-01']",
            "['unterminated, 'x']",
            "[1, 2, 3, 4]",
        ] {
            assert!(
                matches!(decode_record(raw), Err(RecordError::Malformed(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_is_magnet() {
        assert!(is_magnet(MAGNET));
        assert!(is_magnet("MAGNET:?xt=urn:btih:abc"));
        assert!(!is_magnet("magnet:?"));
        assert!(!is_magnet("SONE-622"));
    }
}

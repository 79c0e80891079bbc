//! RFC 5322-ish header parsing: folding, encoded-words (RFC 2047), message ids, and dates.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::{debug, warn};

use crate::model::message::HeaderMap;

/// Base64 engine for encoded-words, which are frequently sent without padding.
const ENCODED_WORD_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Parse a header block into a [`HeaderMap`].
///
/// - `name: value` starts a header (name lower-cased, value trimmed).
/// - A line starting with whitespace folds onto the current header's last
///   value as `" " + trimmed`.
/// - Any other line resets the current header, so stray text never folds.
pub fn parse_headers(block: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let mut current: Option<usize> = None;

    for line in block.lines() {
        if line.trim().is_empty() {
            current = None;
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            if let Some(slot) = current {
                headers.fold_into(slot, line);
            }
            continue;
        }

        current = match line.split_once(':') {
            Some((name, value)) if is_header_name(name) => {
                Some(headers.append(name.trim_end(), value.trim()))
            }
            _ => None,
        };
    }

    headers
}

fn is_header_name(name: &str) -> bool {
    let name = name.trim_end();
    !name.is_empty() && !name.contains(char::is_whitespace)
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Tokens that fail to decode are kept verbatim.
pub fn decode_encoded_words(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // Whitespace between two adjacent encoded-words is not part of the text.
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];
        match decode_word(after_start) {
            Some((text, consumed)) => {
                result.push_str(&text);
                remaining = &after_start[consumed..];
                last_was_encoded = true;
            }
            None => {
                result.push_str("=?");
                remaining = after_start;
                last_was_encoded = false;
            }
        }
    }

    result.push_str(remaining);
    result
}

/// Decode `charset?enc?text?=` (the part after `=?`), returning the text and
/// the number of bytes consumed.
fn decode_word(s: &str) -> Option<(String, usize)> {
    let (charset, rest) = s.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let encoded = &rest[..end];
    if charset.is_empty() || encoded.contains(char::is_whitespace) {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => ENCODED_WORD_B64.decode(encoded).ok()?,
        "Q" | "q" => decode_q(encoded),
        _ => return None,
    };

    let consumed = charset.len() + 1 + encoding.len() + 1 + end + 2;
    Some((decode_charset(charset, &bytes), consumed))
}

/// Q-encoding: `_` is a space, `=XX` is a byte.
fn decode_q(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(b) => {
                        out.push(b);
                        i += 3;
                        continue;
                    }
                    None => out.push(b'='),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    out
}

/// Decode bytes in a named charset, ignoring any RFC 2231 `*lang` suffix.
fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    let label = charset.split('*').next().unwrap_or(charset);
    match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(encoding) => encoding.decode(bytes).0.into_owned(),
        None => {
            warn!(charset = label, "Unknown charset, falling back to UTF-8 lossy");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Strip surrounding whitespace and angle brackets from a message id.
///
/// `" <abc@example.com> "` → `"abc@example.com"`
pub fn strip_angle_brackets(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(start) = trimmed.find('<') {
        if let Some(len) = trimmed[start..].find('>') {
            return trimmed[start + 1..start + len].trim().to_string();
        }
    }
    trimmed.trim_matches(['<', '>']).trim().to_string()
}

/// Parse an email date string in the common real-world formats.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Drop trailing comments such as "(PST)".
    let without_comment = match trimmed.find('(') {
        Some(pos) => trimmed[..pos].trim_end(),
        None => trimmed,
    };

    if let Ok(dt) = DateTime::parse_from_rfc2822(without_comment) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(without_comment) {
        return Some(dt.with_timezone(&Utc));
    }

    let no_dow = strip_day_of_week(without_comment);
    let formats = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M %z",
        "%d %b %Y %H:%M:%S",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in &formats {
        if let Ok(dt) = DateTime::parse_from_str(no_dow, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(no_dow, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Some(dt) = mail_parser_date(trimmed) {
        return Some(dt);
    }

    debug!(date = trimmed, "Could not parse date");
    None
}

/// Last resort: let `mail-parser` try its more forgiving date grammar.
fn mail_parser_date(input: &str) -> Option<DateTime<Utc>> {
    let fake_msg = format!("Date: {input}\n\n");
    let parsed = mail_parser::MessageParser::default().parse(fake_msg.as_bytes())?;
    let rfc3339 = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&rfc3339)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn strip_day_of_week(s: &str) -> &str {
    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    for day in DAYS {
        if let Some(rest) = s.strip_prefix(day) {
            return rest.trim_start_matches(',').trim_start();
        }
    }
    s
}

//! In-memory MBOX splitting and message parsing.
//!
//! Tolerant of malformed input: a missing header/body separator makes the
//! whole text the body, and `From ` separators are honored even when not
//! preceded by a blank line.

use tracing::debug;

use crate::model::message::Message;
use crate::parser::header;

/// Decode raw archive bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every
/// byte). A leading UTF-8 BOM is dropped.
pub fn decode_archive(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Split an archive into raw message texts.
///
/// A line starting with `From ` that is not the first line of the buffer
/// ends the current message. Separator lines are discarded. Messages that
/// are only whitespace are skipped.
pub fn split_archive(raw: &str) -> Vec<String> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let mut messages = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut prev_line_was_blank = true;

    for (line_no, line) in raw.split('\n').enumerate() {
        if is_mbox_separator(line) {
            if line_no > 0 {
                if !prev_line_was_blank {
                    debug!(
                        line = line_no + 1,
                        "Found 'From ' separator without preceding blank line"
                    );
                }
                flush(&mut current, &mut messages);
            }
            prev_line_was_blank = false;
            continue;
        }
        prev_line_was_blank = is_blank_line(line);
        current.push(line);
    }
    flush(&mut current, &mut messages);

    messages
}

fn flush(lines: &mut Vec<&str>, out: &mut Vec<String>) {
    let joined = lines.join("\n");
    lines.clear();
    // The blank line before the next separator belongs to the mbox framing.
    let text = joined.trim_end_matches(['\r', '\n']);
    if !text.trim().is_empty() {
        out.push(text.to_string());
    }
}

/// Parse one raw message into headers and body.
pub fn parse_message(raw: &str) -> Message {
    let (header_block, body) = split_header_body(raw).unwrap_or(("", raw));
    let headers = header::parse_headers(header_block);
    let message_id = headers
        .get("message-id")
        .map(header::strip_angle_brackets)
        .filter(|id| !id.is_empty());

    Message {
        headers,
        body: body.to_string(),
        source_url: None,
        message_id,
    }
}

/// Split and parse every message of an archive, in archive order.
pub fn parse_archive(raw: &str) -> Vec<Message> {
    let messages: Vec<Message> = split_archive(raw)
        .iter()
        .map(|m| parse_message(m))
        .collect();
    debug!(count = messages.len(), "Parsed archive");
    messages
}

/// Split at the first blank line (`\n\n` or `\r\n\r\n`), whichever comes first.
fn split_header_body(raw: &str) -> Option<(&str, &str)> {
    if let Some(rest) = raw.strip_prefix("\r\n").or_else(|| raw.strip_prefix('\n')) {
        return Some(("", rest));
    }

    let lf = raw.find("\n\n").map(|pos| (pos, 2));
    let crlf = raw.find("\r\n\r\n").map(|pos| (pos, 4));
    let (pos, len) = match (lf, crlf) {
        (Some(a), Some(b)) => {
            if a.0 <= b.0 {
                a
            } else {
                b
            }
        }
        (a, b) => a.or(b)?,
    };
    Some((&raw[..pos], &raw[pos + len..]))
}

/// Check whether a line is an MBOX separator (`From ` at the start).
fn is_mbox_separator(line: &str) -> bool {
    line.strip_prefix('\u{feff}')
        .unwrap_or(line)
        .starts_with("From ")
}

/// Check whether a line is blank (empty or only whitespace / CR).
fn is_blank_line(line: &str) -> bool {
    line.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::HeaderMap;

    #[test]
    fn test_is_mbox_separator() {
        assert!(is_mbox_separator("From user@example.com Thu Jan 01 00:00:00 2024"));
        assert!(is_mbox_separator("From mboxrd@z Thu Jan  1 00:00:00 1970"));
        assert!(!is_mbox_separator("from user@example.com"));
        assert!(!is_mbox_separator(">From user@example.com"));
        assert!(!is_mbox_separator("From: user@example.com"));
    }

    #[test]
    fn test_is_blank_line() {
        assert!(is_blank_line(""));
        assert!(is_blank_line("\r"));
        assert!(is_blank_line("  "));
        assert!(!is_blank_line("hello"));
    }

    #[test]
    fn test_split_archive_discards_separators() {
        let raw = "From a@b Mon\nSubject: one\n\nbody one\n\nFrom c@d Tue\nSubject: two\n\nbody two\n";
        let parts = split_archive(raw);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "Subject: one\n\nbody one");
        assert_eq!(parts[1], "Subject: two\n\nbody two");
    }

    #[test]
    fn test_split_archive_without_leading_separator() {
        let raw = "Subject: only\n\nbody";
        assert_eq!(split_archive(raw), vec!["Subject: only\n\nbody".to_string()]);
    }

    #[test]
    fn test_split_archive_separator_without_blank_line() {
        let raw = "From x\nSubject: a\n\nbody a\nFrom y\nSubject: b\n\nbody b";
        let parts = split_archive(raw);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "Subject: a\n\nbody a");
    }

    #[test]
    fn test_split_archive_escaped_from_stays_in_body() {
        let raw = "From x\nSubject: a\n\n>From the start\nmore\n";
        let parts = split_archive(raw);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].contains(">From the start"));
    }

    #[test]
    fn test_split_archive_empty() {
        assert!(split_archive("").is_empty());
        assert!(split_archive("From x\n\n").is_empty());
    }

    #[test]
    fn test_split_archive_with_bom() {
        let raw = "\u{feff}From x\nSubject: a\n\nbody";
        assert_eq!(split_archive(raw), vec!["Subject: a\n\nbody".to_string()]);
    }

    #[test]
    fn test_archive_round_trip_preserves_headers_and_bodies() {
        let mut first = HeaderMap::new();
        first.append("from", "Alice <alice@example.com>");
        first.append("received", "by mx1");
        first.append("subject", "[PATCH 1/2] long subject that wraps");
        first.append("received", "by mx2");
        first.append("message-id", "<a1@example.com>");

        let mut second = HeaderMap::new();
        second.append("from", "Bob <bob@example.com>");
        second.append("subject", "Re: plain");

        let expected = [
            (first, "line one\nline two\n\nsecond paragraph"),
            (second, "plain"),
        ];

        let raw = concat!(
            "From alice Mon Jan  1 00:00:00 2024\n",
            "From: Alice <alice@example.com>\n",
            "Received: by mx1\n",
            "Subject: [PATCH 1/2] long subject\n",
            "  that wraps\n",
            "Received: by mx2\n",
            "Message-ID: <a1@example.com>\n",
            "\n",
            "line one\nline two\n\nsecond paragraph\n",
            "\n",
            "From bob Mon Jan  1 00:00:00 2024\n",
            "From: Bob <bob@example.com>\n",
            "Subject: Re: plain\n",
            "\n",
            "plain\n",
        );

        let parsed = parse_archive(raw);
        assert_eq!(parsed.len(), expected.len());
        for (msg, (headers, body)) in parsed.iter().zip(&expected) {
            assert_eq!(&msg.headers, headers);
            assert_eq!(msg.body, *body);
        }
        assert_eq!(parsed[0].message_id.as_deref(), Some("a1@example.com"));

        // Reparsing a single split message gives the same result.
        let again: Vec<Message> = split_archive(raw).iter().map(|m| parse_message(m)).collect();
        assert_eq!(again, parsed);
    }

    #[test]
    fn test_trailing_newlines_belong_to_framing() {
        let raw = "From x\nSubject: s\n\nline one\nline two\n\n\nFrom y\nSubject: t\n\nlast\r\n";
        let parsed = parse_archive(raw);
        assert_eq!(parsed[0].body, "line one\nline two");
        assert_eq!(parsed[1].body, "last");
    }

    #[test]
    fn test_parse_message_splits_headers_and_body() {
        let msg = parse_message("Subject: Hi\nMessage-ID: <M1@Example>\n\nHello\n\nWorld");
        assert_eq!(msg.subject(), "Hi");
        assert_eq!(msg.message_id.as_deref(), Some("M1@Example"));
        assert_eq!(msg.body, "Hello\n\nWorld");
    }

    #[test]
    fn test_parse_message_crlf() {
        let msg = parse_message("Subject: Hi\r\nFrom: a@b\r\n\r\nBody\r\n");
        assert_eq!(msg.subject(), "Hi");
        assert_eq!(msg.header("from"), Some("a@b"));
        assert_eq!(msg.body, "Body\r\n");
    }

    #[test]
    fn test_parse_message_without_separator_is_all_body() {
        let msg = parse_message("just some text\nwith lines");
        assert!(msg.headers.is_empty());
        assert_eq!(msg.body, "just some text\nwith lines");
        assert!(msg.message_id.is_none());
    }

    #[test]
    fn test_decode_archive_latin1_fallback() {
        let bytes = b"Subject: caf\xe9\n\nbody";
        assert_eq!(decode_archive(bytes), "Subject: café\n\nbody");
    }

    #[test]
    fn test_decode_archive_strips_bom() {
        assert_eq!(decode_archive(b"\xEF\xBB\xBFFrom x\n"), "From x\n");
    }
}

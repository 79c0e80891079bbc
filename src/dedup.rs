//! Duplicate delivery collapsing.
//!
//! The same logical message often reaches an archive more than once (list
//! copy, direct copy, a base64-wrapped copy from a digest). Copies are
//! grouped by normalized `Message-ID` and the one with the best
//! [`quality_score`] is kept.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::model::message::Message;
use crate::parser::header::strip_angle_brackets;

// Score weights. Tuned against real list traffic; changing any of them
// changes which copy survives.
const BODY_LENGTH_CAP: usize = 4000;
const BODY_LENGTH_DIVISOR: f64 = 1000.0;
const PENALTY_BASE64_ENCODING: f64 = 60.0;
const PENALTY_MBOXRD_ARTIFACT: f64 = 40.0;
const PENALTY_LIST_HEADERS_IN_BODY: f64 = 20.0;
const PENALTY_BASE64_BLOCK: f64 = 20.0;
const BONUS_PLAIN_ENCODING: f64 = 10.0;

/// Lines at least this long that look like base64 count towards the block heuristic.
const BASE64_LINE_MIN_LEN: usize = 80;
/// Number of base64-looking lines that marks a body as an undecoded blob.
const BASE64_LINES_THRESHOLD: usize = 3;

static BASE64_LINE: OnceLock<Regex> = OnceLock::new();
static LIST_HEADER_LINE: OnceLock<Regex> = OnceLock::new();

fn base64_line_regex() -> &'static Regex {
    BASE64_LINE
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9+/]+={0,2}$").expect("valid base64 line regex"))
}

fn list_header_regex() -> &'static Regex {
    LIST_HEADER_LINE.get_or_init(|| {
        Regex::new(r"(?m)^(?:List-Id|X-Mailman-Version):").expect("valid list header regex")
    })
}

/// Normalized id used for grouping: trimmed, angle brackets removed, lower-cased.
///
/// Prefers the `Message-ID` header and falls back to [`Message::message_id`].
pub fn normalize_message_id(msg: &Message) -> Option<String> {
    msg.header("message-id")
        .or(msg.message_id.as_deref())
        .map(|raw| strip_angle_brackets(raw).to_lowercase())
        .filter(|id| !id.is_empty())
}

/// Heuristic fidelity score of a message body. Higher is better.
pub fn quality_score(msg: &Message) -> f64 {
    let body = &msg.body;
    let mut score = body.len().min(BODY_LENGTH_CAP) as f64 / BODY_LENGTH_DIVISOR;

    let encoding = msg
        .header("content-transfer-encoding")
        .unwrap_or_default()
        .to_lowercase();

    if encoding.contains("base64") {
        score -= PENALTY_BASE64_ENCODING;
    }
    if body.starts_with("From mboxrd@z ") {
        score -= PENALTY_MBOXRD_ARTIFACT;
    }
    if list_header_regex().is_match(body) {
        score -= PENALTY_LIST_HEADERS_IN_BODY;
    }
    if looks_like_base64_block(body) {
        score -= PENALTY_BASE64_BLOCK;
    }
    if encoding.contains("8bit") || encoding.contains("7bit") {
        score += BONUS_PLAIN_ENCODING;
    }

    score
}

fn looks_like_base64_block(body: &str) -> bool {
    let re = base64_line_regex();
    body.lines()
        .map(str::trim_end)
        .filter(|line| line.len() >= BASE64_LINE_MIN_LEN && re.is_match(line))
        .take(BASE64_LINES_THRESHOLD)
        .count()
        >= BASE64_LINES_THRESHOLD
}

enum Slot {
    /// A message without a resolvable id, passed through as-is.
    Anonymous(Message),
    /// Representative of an id group.
    Group { best: Message, score: f64 },
}

/// Collapse duplicate deliveries, keeping the best-scored copy per id.
///
/// Output order is the first-seen position of each id; messages without an
/// id keep their original position. Ties keep the first-seen copy.
pub fn dedupe_messages(messages: Vec<Message>) -> Vec<Message> {
    let total = messages.len();
    let mut slots: Vec<Slot> = Vec::with_capacity(total);
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for msg in messages {
        let Some(id) = normalize_message_id(&msg) else {
            slots.push(Slot::Anonymous(msg));
            continue;
        };

        let score = quality_score(&msg);
        match by_id.get(&id) {
            Some(&idx) => {
                if let Slot::Group { best, score: best_score } = &mut slots[idx] {
                    if score > *best_score {
                        *best = msg;
                        *best_score = score;
                    }
                }
            }
            None => {
                by_id.insert(id, slots.len());
                slots.push(Slot::Group { best: msg, score });
            }
        }
    }

    let deduped: Vec<Message> = slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Anonymous(msg) => msg,
            Slot::Group { best, .. } => best,
        })
        .collect();

    if deduped.len() < total {
        debug!(
            duplicates = total - deduped.len(),
            kept = deduped.len(),
            "Collapsed duplicate deliveries"
        );
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_message;

    fn msg(raw: &str) -> Message {
        parse_message(raw)
    }

    #[test]
    fn test_normalize_message_id() {
        let m = msg("Message-ID:  <ABC@Example.COM> \n\nbody");
        assert_eq!(normalize_message_id(&m).as_deref(), Some("abc@example.com"));
    }

    #[test]
    fn test_normalize_falls_back_to_field() {
        let m = Message {
            message_id: Some("<X@Y>".into()),
            ..Default::default()
        };
        assert_eq!(normalize_message_id(&m).as_deref(), Some("x@y"));
        assert!(normalize_message_id(&Message::default()).is_none());
    }

    #[test]
    fn test_score_penalizes_base64_encoding() {
        let plain = msg("Content-Transfer-Encoding: 8bit\n\nhello");
        let b64 = msg("Content-Transfer-Encoding: base64\n\naGVsbG8=");
        assert!(quality_score(&plain) > quality_score(&b64));
        assert!((quality_score(&plain) - (5.0 / 1000.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_score_caps_length_contribution() {
        let long = Message {
            body: "x".repeat(10_000),
            ..Default::default()
        };
        assert!((quality_score(&long) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_penalizes_artifacts() {
        let artifact = Message {
            body: "From mboxrd@z Thu Jan  1 00:00:00 1970\nList-Id: <x.y>\ntext".into(),
            ..Default::default()
        };
        let expected = artifact.body.len() as f64 / 1000.0 - 40.0 - 20.0;
        assert!((quality_score(&artifact) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_score_detects_base64_block() {
        let line = "A".repeat(80);
        let body = format!("{line}\n{line}\n{line}\n");
        let blob = Message {
            body,
            ..Default::default()
        };
        assert!(looks_like_base64_block(&blob.body));
        assert!(quality_score(&blob) < 0.0);

        let two_lines = format!("{line}\n{line}\nshort\n");
        assert!(!looks_like_base64_block(&two_lines));
    }

    #[test]
    fn test_dedup_keeps_plain_text_copy() {
        let garbled = msg(
            "Message-ID: <m1@x>\nContent-Transfer-Encoding: base64\n\nU29tZSBnYXJibGVk\n",
        );
        let readable = msg("Message-ID: <m1@x>\n\nA perfectly readable reply body.\n");
        let out = dedupe_messages(vec![garbled, readable.clone()]);
        assert_eq!(out, vec![readable]);
    }

    #[test]
    fn test_dedup_tie_keeps_first() {
        let a = msg("Message-ID: <m@x>\nX-Copy: a\n\nsame");
        let b = msg("Message-ID: <M@X>\nX-Copy: b\n\nsame");
        let out = dedupe_messages(vec![a.clone(), b]);
        assert_eq!(out, vec![a]);
    }

    #[test]
    fn test_dedup_preserves_order_and_anonymous_messages() {
        let first = msg("Message-ID: <1@x>\n\none");
        let anon = msg("Subject: no id\n\nanon");
        let second = msg("Message-ID: <2@x>\n\ntwo");
        let better_first = msg("Message-ID: <1@x>\n\none, but longer");
        let anon_again = anon.clone();
        let out = dedupe_messages(vec![
            first,
            anon.clone(),
            second.clone(),
            better_first.clone(),
            anon_again.clone(),
        ]);
        assert_eq!(out, vec![better_first, anon, second, anon_again]);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let input = vec![
            msg("Message-ID: <1@x>\n\none"),
            msg("Message-ID: <1@x>\nContent-Transfer-Encoding: 7bit\n\none"),
            msg("Subject: anon\n\nbody"),
            msg("Message-ID: <2@x>\n\ntwo"),
        ];
        let once = dedupe_messages(input);
        let twice = dedupe_messages(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }
}

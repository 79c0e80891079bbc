//! Thread summaries: deduplicated, quote-stripped, length-bounded views of
//! a discussion, plus a reference-pooled variant.

use tracing::debug;

use crate::budget::truncation_marker;
use crate::classify::{detect_patch_kind, normalize_subject};
use crate::dedup::dedupe_messages;
use crate::model::message::Message;
use crate::model::summary::{NormalizedItem, NormalizedThreadSummary, SummaryItem, ThreadSummary};
use crate::parser::header::{decode_encoded_words, parse_date};
use crate::parser::trailers::extract_trailers;
use crate::strip::strip_quoted;

/// Knobs for [`build_thread_summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Items kept after deduplication.
    pub max_messages: usize,
    /// Drop quoted replies, attributions, and signatures from bodies.
    pub strip_quoted: bool,
    /// Bodies longer than this (in bytes) are cut and marked.
    pub short_body_bytes: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            max_messages: 50,
            strip_quoted: true,
            short_body_bytes: 1500,
        }
    }
}

/// Summarize a thread.
pub fn build_thread_summary(messages: Vec<Message>, options: &SummaryOptions) -> ThreadSummary {
    let unique = dedupe_messages(messages);
    let message_count = unique.len();
    let truncated = message_count > options.max_messages;

    let items: Vec<SummaryItem> = unique
        .iter()
        .take(options.max_messages)
        .map(|msg| summarize_message(msg, options))
        .collect();

    debug!(
        messages = message_count,
        items = items.len(),
        truncated,
        "Built thread summary"
    );

    ThreadSummary {
        message_count,
        truncated,
        items,
    }
}

fn summarize_message(msg: &Message, options: &SummaryOptions) -> SummaryItem {
    let body = if options.strip_quoted {
        strip_quoted(&msg.body)
    } else {
        msg.body.clone()
    };

    SummaryItem {
        message_id: msg.message_id.clone(),
        url: msg.source_url.clone(),
        from: decode_encoded_words(msg.header("from").unwrap_or_default()),
        subject: decode_encoded_words(msg.subject()),
        date: msg
            .header("date")
            .and_then(parse_date)
            .map(|d| d.to_rfc3339()),
        kind: detect_patch_kind(msg),
        body: truncate_body(body.trim(), options.short_body_bytes),
        trailers: extract_trailers(&msg.body),
    }
}

/// Cut `body` to at most `max_bytes` (backing off to a char boundary) and
/// append the truncation marker.
fn truncate_body(body: &str, max_bytes: usize) -> String {
    if body.len() <= max_bytes {
        return body.to_string();
    }
    let mut cut = max_bytes;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &body[..cut], truncation_marker(body.len() - cut))
}

/// Pool participants and normalized subjects so repeated values are stored
/// once and referenced by index.
pub fn normalize_thread_summary(summary: &ThreadSummary) -> NormalizedThreadSummary {
    let mut subjects = Vec::new();
    let mut participants = Vec::new();

    let items = summary
        .items
        .iter()
        .map(|item| NormalizedItem {
            from: intern(&mut participants, &item.from),
            subject: intern(&mut subjects, &normalize_subject(&item.subject)),
            message_id: item.message_id.clone(),
            date: item.date.clone(),
            kind: item.kind,
            body: item.body.clone(),
        })
        .collect();

    NormalizedThreadSummary {
        subjects,
        participants,
        items,
    }
}

fn intern(pool: &mut Vec<String>, value: &str) -> usize {
    match pool.iter().position(|v| v == value) {
        Some(i) => i,
        None => {
            pool.push(value.to_string());
            pool.len() - 1
        }
    }
}

//! Thread summary types: the flat view and the pooled, normalized view.

use serde::{Deserialize, Serialize};

use super::message::{PatchKind, TrailerLine};

/// One message of a summarized thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Decoded `From:` value.
    pub from: String,
    /// Decoded `Subject:` value.
    pub subject: String,
    /// RFC 3339 date, when the `Date:` header could be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub kind: PatchKind,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailers: Vec<TrailerLine>,
}

/// A deduplicated, size-bounded view of a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    /// Distinct messages in the thread after deduplication.
    pub message_count: usize,
    /// Whether items were dropped by the message limit.
    pub truncated: bool,
    pub items: Vec<SummaryItem>,
}

/// Summary item referencing the participant and subject pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedItem {
    /// Index into [`NormalizedThreadSummary::participants`].
    pub from: usize,
    /// Index into [`NormalizedThreadSummary::subjects`].
    pub subject: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub kind: PatchKind,
    pub body: String,
}

/// Reference-compressed thread summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedThreadSummary {
    pub subjects: Vec<String>,
    pub participants: Vec<String>,
    pub items: Vec<NormalizedItem>,
}

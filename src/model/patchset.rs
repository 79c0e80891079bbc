//! Patch series types.

use serde::{Deserialize, Serialize};

use super::diff::DiffStat;
use super::message::TrailerLine;

/// Result of parsing a `[PATCH vN i/total]` subject tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSubjectTag {
    /// Subject with the whole bracket tag removed.
    pub base: String,
    /// Version token such as `"v3"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

impl PatchSubjectTag {
    /// Numeric part of `version` (`"v3"` → 3).
    pub fn version_number(&self) -> Option<u32> {
        self.version
            .as_deref()
            .and_then(|v| v.trim_start_matches(['v', 'V']).parse().ok())
    }
}

/// Position of the series as announced by its subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesParts {
    pub index: u32,
    pub total: u32,
}

/// Identity of a patch series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<SeriesParts>,
}

/// The `0/n` message introducing a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetter {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Body with reply quoting and signatures removed.
    pub body: String,
}

/// One patch of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchEntry {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_stat: Option<DiffStat>,
    /// Truncated per-file renderings, largest file first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diffs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailers: Vec<TrailerLine>,
}

/// A patch series with its cover letter and aggregate statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patchset {
    pub series: Series,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<CoverLetter>,
    pub patches: Vec<PatchEntry>,
    /// Sum over every patch, independent of diff truncation.
    pub aggregate: DiffStat,
}

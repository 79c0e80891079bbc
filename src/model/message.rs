//! Parsed message, header map, and trailer types.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Ordered multimap of lower-cased header names to their values.
///
/// Names keep first-seen order; each name keeps all of its values in
/// encounter order. Serializes as `{ "name": ["value", ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderMap {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `name` (lower-cased) and return the slot of that
    /// name, for later continuation folding.
    pub fn append(&mut self, name: &str, value: impl Into<String>) -> usize {
        let name = name.to_lowercase();
        let value = value.into();
        match self.entries.iter().position(|(k, _)| *k == name) {
            Some(slot) => {
                self.entries[slot].1.push(value);
                slot
            }
            None => {
                self.entries.push((name, vec![value]));
                self.entries.len() - 1
            }
        }
    }

    /// Fold a continuation line onto the last value stored in `slot`.
    pub fn fold_into(&mut self, slot: usize, continuation: &str) {
        if let Some(last) = self
            .entries
            .get_mut(slot)
            .and_then(|(_, values)| values.last_mut())
        {
            last.push(' ');
            last.push_str(continuation.trim());
        }
    }

    /// First value for `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// All values for `name` in encounter order (case-insensitive).
    pub fn get_all(&self, name: &str) -> &[String] {
        let name = name.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for HeaderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// A single message split out of an archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unfolded headers keyed by lower-case name.
    pub headers: HeaderMap,

    /// Everything after the first blank line, verbatim.
    pub body: String,

    /// Where the message was retrieved from, when the source knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// `Message-ID` without angle brackets, original case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl Message {
    /// First value of a header (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Raw `Subject:` value, or an empty string.
    pub fn subject(&self) -> &str {
        self.header("subject").unwrap_or_default()
    }

    /// Attach a source URL.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

/// A provenance trailer such as `Signed-off-by: Name <addr>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailerLine {
    /// Key in its original case.
    pub key: String,
    pub value: String,
    /// The line as it appeared in the body (trimmed).
    pub raw_line: String,
}

/// Role of a message inside a patch discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchKind {
    /// `[PATCH 0/n]` cover letter.
    Cover,
    /// A patch carrying (or announcing) a diff.
    Patch,
    /// Discussion.
    Reply,
}

impl PatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Patch => "patch",
            Self::Reply => "reply",
        }
    }
}

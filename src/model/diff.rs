//! Diff statistics.

use serde::{Deserialize, Serialize};

/// Line counts for one file touched by a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    pub file: String,
    pub insertions: usize,
    pub deletions: usize,
}

impl FileStat {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            insertions: 0,
            deletions: 0,
        }
    }
}

/// Aggregate statistics for one or more diffs.
///
/// `files == per_file.len()` and the totals are the sums over `per_file`.
/// Build values with [`DiffStat::from_per_file`] or [`DiffStat::merge`] so
/// that stays true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStat {
    pub files: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub per_file: Vec<FileStat>,
}

impl DiffStat {
    /// Derive totals from a per-file association list.
    pub fn from_per_file(per_file: Vec<FileStat>) -> Self {
        Self {
            files: per_file.len(),
            insertions: per_file.iter().map(|f| f.insertions).sum(),
            deletions: per_file.iter().map(|f| f.deletions).sum(),
            per_file,
        }
    }

    /// Sum two stats file by file. Files keep first-seen order.
    pub fn merge(&self, other: &DiffStat) -> DiffStat {
        Self::merge_all([self, other])
    }

    /// Sum any number of stats file by file.
    pub fn merge_all<'a>(stats: impl IntoIterator<Item = &'a DiffStat>) -> DiffStat {
        let per_file = stats
            .into_iter()
            .flat_map(|s| s.per_file.iter())
            .fold(Vec::<FileStat>::new(), |mut acc, f| {
                match acc.iter_mut().find(|e| e.file == f.file) {
                    Some(existing) => {
                        existing.insertions += f.insertions;
                        existing.deletions += f.deletions;
                    }
                    None => acc.push(f.clone()),
                }
                acc
            });
        Self::from_per_file(per_file)
    }

    /// `insertions + deletions`.
    pub fn changed_lines(&self) -> usize {
        self.insertions + self.deletions
    }

    pub fn is_empty(&self) -> bool {
        self.per_file.is_empty()
    }
}

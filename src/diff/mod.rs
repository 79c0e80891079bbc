//! Diff extraction, statistics, and size-bounded rendering.

pub mod stat;
pub mod truncate;

use crate::model::diff::DiffStat;

pub use stat::{compute_diff_stat, extract_diff_blocks};
pub use truncate::truncate_by_hunks;

/// Limits applied when rendering diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Number of files rendered in detail (largest first).
    pub max_files: usize,
    pub max_hunks_per_file: usize,
    /// Lines kept after each hunk header.
    pub max_hunk_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            max_files: 8,
            max_hunks_per_file: 6,
            max_hunk_lines: 40,
        }
    }
}

/// Diffs of one message: full statistics plus truncated renderings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDiffs {
    /// Computed over every block, never just the rendered ones.
    pub stat: DiffStat,
    /// Rendered blocks, largest change first.
    pub diffs: Vec<String>,
}

/// Extract, measure, rank, and truncate the diffs in a message body.
pub fn extract_diffs(body: &str, options: &DiffOptions) -> ExtractedDiffs {
    let blocks = extract_diff_blocks(body);
    let stats: Vec<DiffStat> = blocks.iter().map(|b| compute_diff_stat(b)).collect();
    let stat = DiffStat::merge_all(&stats);

    let mut order: Vec<usize> = (0..blocks.len()).collect();
    // Stable: equally sized blocks keep body order.
    order.sort_by(|&a, &b| stats[b].changed_lines().cmp(&stats[a].changed_lines()));

    let diffs = order
        .into_iter()
        .take(options.max_files)
        .map(|i| {
            truncate_by_hunks(
                &blocks[i],
                options.max_hunks_per_file,
                options.max_hunk_lines,
            )
        })
        .collect();

    ExtractedDiffs { stat, diffs }
}

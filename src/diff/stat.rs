//! Diff block extraction and per-file line statistics.

use crate::model::diff::{DiffStat, FileStat};

/// Split a body into diff blocks, each starting at a `diff --git ` line.
///
/// Text before the first block is ignored. The `-- ` signature that
/// `git format-patch` appends after the last block is not part of it.
pub fn extract_diff_blocks(body: &str) -> Vec<String> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();

    for line in body.lines() {
        if line.starts_with("diff --git ") {
            blocks.push(vec![line]);
        } else if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }

    if let Some(last) = blocks.last_mut() {
        if let Some(sig) = last.iter().position(|l| *l == "-- ") {
            last.truncate(sig);
        }
    }

    blocks.into_iter().map(|lines| lines.join("\n")).collect()
}

/// Count inserted and deleted lines per file.
///
/// The current file comes from `+++ b/<path>`, or from `--- a/<path>` when
/// no file is set yet (deletions). `Binary files` lines and new
/// `diff --git` headers clear it. Lines counted while no file is set are
/// ignored.
pub fn compute_diff_stat(diff_text: &str) -> DiffStat {
    let (_, per_file) = diff_text
        .lines()
        .fold((None, Vec::new()), |(current, per_file), line| {
            step(current, per_file, line)
        });
    DiffStat::from_per_file(per_file)
}

type FoldState = (Option<String>, Vec<FileStat>);

fn step(current: Option<String>, per_file: Vec<FileStat>, line: &str) -> FoldState {
    if line.starts_with("diff --git ") || line.starts_with("Binary files ") {
        return (None, per_file);
    }
    if let Some(path) = line.strip_prefix("+++ b/") {
        return (Some(clean_path(path)), per_file);
    }
    if let Some(path) = line.strip_prefix("--- a/") {
        return (current.or_else(|| Some(clean_path(path))), per_file);
    }
    if line.starts_with("+++") || line.starts_with("---") {
        return (current, per_file);
    }

    let (ins, del) = match line.as_bytes().first() {
        Some(b'+') => (1, 0),
        Some(b'-') => (0, 1),
        _ => return (current, per_file),
    };
    match current {
        Some(file) => {
            let per_file = bump(per_file, &file, ins, del);
            (Some(file), per_file)
        }
        None => (None, per_file),
    }
}

fn bump(mut per_file: Vec<FileStat>, file: &str, ins: usize, del: usize) -> Vec<FileStat> {
    match per_file.iter_mut().find(|f| f.file == file) {
        Some(entry) => {
            entry.insertions += ins;
            entry.deletions += del;
        }
        None => per_file.push(FileStat {
            file: file.to_string(),
            insertions: ins,
            deletions: del,
        }),
    }
    per_file
}

/// Drop the timestamp some diff tools append after a tab.
fn clean_path(path: &str) -> String {
    path.split('\t').next().unwrap_or(path).trim_end().to_string()
}

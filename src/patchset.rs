//! Patch series aggregation.
//!
//! Groups the patch and cover-letter messages of a thread into one named
//! series, separates the cover letter, and sums diff statistics across all
//! patches.

use tracing::debug;

use crate::classify::{detect_patch_kind, parse_patch_subject};
use crate::diff::{compute_diff_stat, extract_diff_blocks, extract_diffs, DiffOptions};
use crate::model::diff::DiffStat;
use crate::model::message::{Message, PatchKind};
use crate::model::patchset::{
    CoverLetter, PatchEntry, PatchSubjectTag, Patchset, Series, SeriesParts,
};
use crate::parser::header::decode_encoded_words;
use crate::parser::trailers::extract_trailers;
use crate::strip::strip_quoted;

/// How much diff content each patch entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchsetOptions {
    pub diff: DiffOptions,
    /// Attach truncated diff text to each patch.
    pub include_diffs: bool,
    /// Only compute statistics; never render diff text.
    pub stat_only: bool,
}

impl Default for PatchsetOptions {
    fn default() -> Self {
        Self {
            diff: DiffOptions::default(),
            include_diffs: true,
            stat_only: false,
        }
    }
}

/// Build the patch series contained in `messages`.
///
/// Returns `None` when no message is a patch or cover letter. That is a
/// normal outcome for plain discussion threads, not an error.
pub fn build_patchset(messages: &[Message], options: &PatchsetOptions) -> Option<Patchset> {
    let candidates: Vec<&Message> = messages
        .iter()
        .filter(|m| detect_patch_kind(m) != PatchKind::Reply)
        .collect();

    if candidates.is_empty() {
        debug!(messages = messages.len(), "No patch messages in thread");
        return None;
    }

    let subjects: Vec<String> = candidates
        .iter()
        .map(|m| decode_encoded_words(m.subject()))
        .collect();
    let parsed: Vec<PatchSubjectTag> = subjects.iter().map(|s| parse_patch_subject(s)).collect();

    let series = Series {
        subject: most_frequent_base(&parsed),
        version: highest_version(&parsed),
        parts: series_parts(&parsed, candidates.len()),
    };

    // Correlated by position in `parsed`, which mirrors `candidates`.
    let cover_pos = parsed.iter().position(|p| p.index == Some(0));

    let cover_letter = cover_pos.map(|i| CoverLetter {
        subject: subjects[i].clone(),
        message_id: candidates[i].message_id.clone(),
        url: candidates[i].source_url.clone(),
        body: strip_quoted(&candidates[i].body).trim().to_string(),
    });

    let patches: Vec<PatchEntry> = candidates
        .iter()
        .zip(&subjects)
        .enumerate()
        .filter(|(i, _)| Some(*i) != cover_pos)
        .map(|(_, (msg, subject))| build_entry(msg, subject, options))
        .collect();

    let aggregate = DiffStat::merge_all(patches.iter().filter_map(|p| p.diff_stat.as_ref()));

    debug!(
        subject = %series.subject,
        patches = patches.len(),
        files = aggregate.files,
        has_cover = cover_letter.is_some(),
        "Built patchset"
    );

    Some(Patchset {
        series,
        cover_letter,
        patches,
        aggregate,
    })
}

fn build_entry(msg: &Message, subject: &str, options: &PatchsetOptions) -> PatchEntry {
    let (stat, diffs) = if options.stat_only {
        let blocks = extract_diff_blocks(&msg.body);
        let stats: Vec<DiffStat> = blocks.iter().map(|b| compute_diff_stat(b)).collect();
        (DiffStat::merge_all(&stats), None)
    } else {
        let extracted = extract_diffs(&msg.body, &options.diff);
        let diffs = Some(extracted.diffs).filter(|d| options.include_diffs && !d.is_empty());
        (extracted.stat, diffs)
    };

    PatchEntry {
        subject: subject.to_string(),
        message_id: msg.message_id.clone(),
        url: msg.source_url.clone(),
        diff_stat: Some(stat).filter(|s| !s.is_empty()),
        diffs,
        trailers: extract_trailers(&msg.body),
    }
}

/// Most common `base`; ties go to the base seen first.
fn most_frequent_base(parsed: &[PatchSubjectTag]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for tag in parsed {
        match counts.iter_mut().find(|(base, _)| *base == tag.base) {
            Some(entry) => entry.1 += 1,
            None => counts.push((&tag.base, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (base, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((base, count));
        }
    }
    best.map(|(base, _)| base.to_string()).unwrap_or_default()
}

/// Highest `vN` across all subjects that carry one.
fn highest_version(parsed: &[PatchSubjectTag]) -> Option<String> {
    parsed
        .iter()
        .filter_map(PatchSubjectTag::version_number)
        .max()
        .map(|n| format!("v{n}"))
}

fn series_parts(parsed: &[PatchSubjectTag], candidate_count: usize) -> Option<SeriesParts> {
    parsed.iter().find_map(|tag| {
        let index = tag.index?;
        Some(SeriesParts {
            index,
            total: tag
                .total
                .unwrap_or_else(|| u32::try_from(candidate_count).unwrap_or(u32::MAX)),
        })
    })
}

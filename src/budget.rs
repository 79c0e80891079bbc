//! Approximate token budgeting for summaries and patchsets.
//!
//! Uses the ~4 characters per token heuristic; no tokenizer is involved.
//! Both allocators walk their input once, in order, and never revisit a
//! decision: slack left by a trimmed item is not handed back to earlier ones.

use tracing::debug;

use crate::error::{CompactError, Result};
use crate::model::patchset::Patchset;
use crate::model::summary::ThreadSummary;

/// Characters per token estimate.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate tokens for a text string: `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Marker appended to any text cut short.
pub fn truncation_marker(dropped_bytes: usize) -> String {
    format!("...[truncated {dropped_bytes} bytes]")
}

/// Budget parameters shared by both allocators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBudget {
    /// Requested budget in tokens.
    pub budget: usize,
    /// Fraction the output may exceed `budget` by.
    pub overflow_allowance: f64,
    /// Fixed cost of a summary item's metadata.
    pub base_per_item: usize,
    /// Fixed cost of a patch entry's metadata.
    pub base_per_patch: usize,
}

impl TokenBudget {
    pub const DEFAULT_OVERFLOW_ALLOWANCE: f64 = 0.10;
    pub const DEFAULT_BASE_PER_ITEM: usize = 24;
    pub const DEFAULT_BASE_PER_PATCH: usize = 40;

    /// Budget with default overflow and per-entry costs.
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            overflow_allowance: Self::DEFAULT_OVERFLOW_ALLOWANCE,
            base_per_item: Self::DEFAULT_BASE_PER_ITEM,
            base_per_patch: Self::DEFAULT_BASE_PER_PATCH,
        }
    }

    /// Replace the overflow allowance, rejecting negative or non-finite values.
    pub fn with_overflow_allowance(mut self, overflow_allowance: f64) -> Result<Self> {
        self.overflow_allowance = overflow_allowance;
        self.validate()?;
        Ok(self)
    }

    /// Check values that may have come from a config file.
    pub fn validate(&self) -> Result<()> {
        if !self.overflow_allowance.is_finite() || self.overflow_allowance < 0.0 {
            return Err(CompactError::invalid_option(
                "overflow_allowance",
                format!(
                    "must be a finite, non-negative fraction (got {})",
                    self.overflow_allowance
                ),
            ));
        }
        Ok(())
    }

    /// `floor(budget * (1 + overflow_allowance))`.
    pub fn hard_limit(&self) -> usize {
        (self.budget as f64 * (1.0 + self.overflow_allowance)).floor() as usize
    }
}

/// Cut `text` so that it, plus the truncation marker, fits in `max_chars`.
///
/// Text that already fits is returned unchanged. When not even the marker
/// fits, the result is empty.
pub fn trim_with_marker(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    // The marker can only get shorter as more text is kept.
    let reserve = truncation_marker(text.len()).chars().count();
    if max_chars < reserve {
        return String::new();
    }

    let cut = text
        .char_indices()
        .nth(max_chars - reserve)
        .map_or(text.len(), |(pos, _)| pos);
    format!("{}{}", &text[..cut], truncation_marker(text.len() - cut))
}

fn head_cost(base: usize, subject: &str) -> f64 {
    base as f64 + 0.5 * estimate_tokens(subject) as f64
}

/// Fit a thread summary into a token budget.
///
/// Items are taken in order. An item whose metadata alone does not fit ends
/// the walk; an item whose body does not fit gets its body trimmed.
pub fn apply_token_budget_to_thread_summary(
    summary: ThreadSummary,
    budget: &TokenBudget,
) -> ThreadSummary {
    let hard = budget.hard_limit() as f64;
    let input_len = summary.items.len();
    let mut used = 0.0_f64;
    let mut items = Vec::with_capacity(input_len);

    for mut item in summary.items {
        let head = head_cost(budget.base_per_item, &item.subject);
        if used + head >= hard {
            break;
        }

        if used + head + estimate_tokens(&item.body) as f64 > hard {
            let remaining = (hard - used - head).floor() as usize;
            item.body = trim_with_marker(&item.body, remaining * CHARS_PER_TOKEN);
        }

        used += head + estimate_tokens(&item.body) as f64;
        items.push(item);
    }

    debug!(
        budget = budget.budget,
        hard_limit = budget.hard_limit(),
        used,
        kept = items.len(),
        dropped = input_len - items.len(),
        "Applied token budget to thread summary"
    );

    ThreadSummary {
        message_count: summary.message_count,
        truncated: summary.truncated || items.len() < input_len,
        items,
    }
}

/// Fit a patchset's diffs into a token budget.
///
/// Every patch entry is kept. A patch whose metadata does not fit loses all
/// its diffs (and is not charged); otherwise diffs are added while they fit,
/// the first one that does not is trimmed, and the rest of that patch's
/// diffs are dropped. Later patches are still attempted.
pub fn apply_token_budget_to_patchset(patchset: Patchset, budget: &TokenBudget) -> Patchset {
    let hard = budget.hard_limit() as f64;
    let mut used = 0.0_f64;
    let mut patches = Vec::with_capacity(patchset.patches.len());

    for mut patch in patchset.patches {
        let meta = head_cost(budget.base_per_patch, &patch.subject);
        if used + meta >= hard {
            if let Some(diffs) = patch.diffs.as_mut() {
                diffs.clear();
            }
            patches.push(patch);
            continue;
        }
        used += meta;

        if let Some(diffs) = patch.diffs.take() {
            let mut kept = Vec::with_capacity(diffs.len());
            for diff in diffs {
                let cost = estimate_tokens(&diff) as f64;
                if used + cost <= hard {
                    used += cost;
                    kept.push(diff);
                    continue;
                }

                let remaining = (hard - used).floor() as usize;
                let trimmed = trim_with_marker(&diff, remaining * CHARS_PER_TOKEN);
                if !trimmed.is_empty() {
                    used += estimate_tokens(&trimmed) as f64;
                    kept.push(trimmed);
                }
                break;
            }
            patch.diffs = Some(kept);
        }
        patches.push(patch);
    }

    debug!(
        budget = budget.budget,
        hard_limit = budget.hard_limit(),
        used,
        "Applied token budget to patchset"
    );

    Patchset { patches, ..patchset }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::diff::DiffStat;
    use crate::model::message::PatchKind;
    use crate::model::patchset::{PatchEntry, Series};
    use crate::model::summary::SummaryItem;

    fn item(subject: &str, body_len: usize) -> SummaryItem {
        SummaryItem {
            message_id: None,
            url: None,
            from: "a@x".into(),
            subject: subject.into(),
            date: None,
            kind: PatchKind::Reply,
            body: "b".repeat(body_len),
            trailers: Vec::new(),
        }
    }

    fn summary(items: Vec<SummaryItem>) -> ThreadSummary {
        ThreadSummary {
            message_count: items.len(),
            truncated: false,
            items,
        }
    }

    fn summary_cost(summary: &ThreadSummary, budget: &TokenBudget) -> f64 {
        summary
            .items
            .iter()
            .map(|i| head_cost(budget.base_per_item, &i.subject) + estimate_tokens(&i.body) as f64)
            .sum()
    }

    fn patch(subject: &str, diffs: Vec<String>) -> PatchEntry {
        PatchEntry {
            subject: subject.into(),
            message_id: None,
            url: None,
            diff_stat: None,
            diffs: Some(diffs),
            trailers: Vec::new(),
        }
    }

    fn patchset(patches: Vec<PatchEntry>) -> Patchset {
        Patchset {
            series: Series {
                subject: "s".into(),
                version: None,
                parts: None,
            },
            cover_letter: None,
            patches,
            aggregate: DiffStat::default(),
        }
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("hi"), 1);
        assert_eq!(estimate_tokens("test"), 1);
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn test_hard_limit() {
        assert_eq!(TokenBudget::new(1000).hard_limit(), 1100);
        assert_eq!(TokenBudget::new(15).hard_limit(), 16);
        assert_eq!(TokenBudget::new(0).hard_limit(), 0);
    }

    #[test]
    fn test_invalid_overflow_rejected() {
        assert!(TokenBudget::new(10).with_overflow_allowance(-0.5).is_err());
        assert!(TokenBudget::new(10).with_overflow_allowance(f64::NAN).is_err());
        let ok = TokenBudget::new(10).with_overflow_allowance(0.0).unwrap();
        assert_eq!(ok.hard_limit(), 10);
    }

    #[test]
    fn test_trim_with_marker_fits() {
        let text = "x".repeat(200);
        let out = trim_with_marker(&text, 100);
        assert!(out.chars().count() <= 100);
        assert!(out.ends_with("bytes]"));
        assert!(out.starts_with("xxx"));
        assert_eq!(trim_with_marker("short", 100), "short");
        assert_eq!(trim_with_marker(&text, 5), "");
    }

    #[test]
    fn test_trim_with_marker_respects_char_boundaries() {
        let text = "é".repeat(100);
        let out = trim_with_marker(&text, 40);
        assert!(out.starts_with('é'));
        assert!(out.chars().count() <= 40);
    }

    #[test]
    fn test_summary_everything_fits() {
        let input = summary(vec![item("a", 40), item("b", 40)]);
        let out = apply_token_budget_to_thread_summary(input.clone(), &TokenBudget::new(1000));
        assert_eq!(out, input);
    }

    #[test]
    fn test_summary_trims_body_then_stops() {
        let input = summary(vec![item("a", 400), item("b", 400), item("c", 400)]);
        let budget = TokenBudget::new(150);
        let out = apply_token_budget_to_thread_summary(input, &budget);

        // First item: 24.5 head + 100 body = 124.5; second: 24.5 head, trimmed body.
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.items[0].body.len(), 400);
        assert!(out.items[1].body.contains("[truncated"));
        assert!(out.truncated);
        assert!(summary_cost(&out, &budget) <= budget.hard_limit() as f64);
    }

    #[test]
    fn test_summary_head_that_does_not_fit_stops_walk() {
        let input = summary(vec![item("a", 0), item("b", 0)]);
        let out = apply_token_budget_to_thread_summary(input, &TokenBudget::new(30));
        // 33 hard limit: first head 24.5 fits, second would reach 49.
        assert_eq!(out.items.len(), 1);
    }

    #[test]
    fn test_summary_budget_monotonic() {
        let input = summary((0..6).map(|i| item(&format!("subject {i}"), 150 + i * 70)).collect());
        let mut previous: Option<(usize, usize)> = None;
        for budget in (0..=600).rev().step_by(25) {
            let budget = TokenBudget::new(budget);
            let out = apply_token_budget_to_thread_summary(input.clone(), &budget);
            assert!(summary_cost(&out, &budget) <= budget.hard_limit() as f64);
            let chars: usize = out.items.iter().map(|i| i.body.chars().count()).sum();
            if let Some((prev_items, prev_chars)) = previous {
                assert!(out.items.len() <= prev_items);
                assert!(chars <= prev_chars);
            }
            previous = Some((out.items.len(), chars));
        }
    }

    #[test]
    fn test_patchset_trims_first_overflowing_diff() {
        let input = patchset(vec![patch(
            "p1",
            vec!["a".repeat(100), "b".repeat(400), "c".repeat(40)],
        )]);
        // hard = 110: meta 40.5, first diff 25, second trimmed to the remaining 44 tokens.
        let out = apply_token_budget_to_patchset(input, &TokenBudget::new(100));
        let diffs = out.patches[0].diffs.as_ref().unwrap();
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].len(), 100);
        assert!(diffs[1].starts_with("bbb"));
        assert!(diffs[1].ends_with("bytes]"));
        assert!(diffs[1].chars().count() <= 44 * CHARS_PER_TOKEN);
    }

    #[test]
    fn test_patchset_keeps_entries_without_diffs_when_over_budget() {
        let input = patchset(vec![
            patch("p1", vec!["a".repeat(200)]),
            patch("p2", vec!["b".repeat(200)]),
        ]);
        let out = apply_token_budget_to_patchset(input, &TokenBudget::new(60));
        assert_eq!(out.patches.len(), 2);
        // hard = 66: p1 meta 40.5 fits with a trimmed diff, p2 meta no longer fits.
        assert_eq!(out.patches[0].diffs.as_ref().unwrap().len(), 1);
        assert!(out.patches[1].diffs.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_patchset_later_patches_still_attempted() {
        let long_subject = "s".repeat(1000);
        let input = patchset(vec![
            patch(&long_subject, vec!["a".repeat(8)]),
            patch("short", vec!["b".repeat(8)]),
        ]);
        let out = apply_token_budget_to_patchset(input, &TokenBudget::new(100));
        assert!(out.patches[0].diffs.as_ref().unwrap().is_empty());
        assert_eq!(out.patches[1].diffs.as_ref().unwrap(), &vec!["b".repeat(8)]);
    }
}

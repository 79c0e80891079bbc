//! End-to-end entry points: raw archive text in, compact views out.

use std::path::Path;

use tracing::debug;

use crate::budget::{apply_token_budget_to_patchset, apply_token_budget_to_thread_summary, TokenBudget};
use crate::config::Config;
use crate::dedup::dedupe_messages;
use crate::diff::DiffOptions;
use crate::error::{CompactError, Result};
use crate::model::message::Message;
use crate::model::patchset::Patchset;
use crate::model::summary::ThreadSummary;
use crate::parser::mbox::decode_archive;
use crate::parser::parse_archive;
use crate::patchset::{build_patchset, PatchsetOptions};
use crate::summary::{build_thread_summary, SummaryOptions};

/// Everything that shapes the output of both pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompactOptions {
    pub summary: SummaryOptions,
    pub patchset: PatchsetOptions,
    /// Applied after building, when set.
    pub token_budget: Option<TokenBudget>,
}

impl CompactOptions {
    /// Options taken from the configuration file, validated.
    pub fn from_config(config: &Config) -> Result<Self> {
        let options = Self {
            summary: SummaryOptions {
                max_messages: config.summary.max_messages,
                strip_quoted: config.summary.strip_quoted,
                short_body_bytes: config.summary.short_body_bytes,
            },
            patchset: PatchsetOptions {
                diff: DiffOptions {
                    max_files: config.diff.max_files,
                    max_hunks_per_file: config.diff.max_hunks_per_file,
                    max_hunk_lines: config.diff.max_hunk_lines,
                },
                include_diffs: config.diff.include_diffs,
                stat_only: config.diff.stat_only,
            },
            token_budget: config
                .budget
                .token_budget
                .map(|b| config.budget.token_budget_for(b)),
        };
        options.validate()?;
        Ok(options)
    }

    /// Reject values no pipeline can honor.
    pub fn validate(&self) -> Result<()> {
        if self.summary.max_messages == 0 {
            return Err(CompactError::invalid_option(
                "max_messages",
                "must be at least 1",
            ));
        }
        if let Some(budget) = &self.token_budget {
            budget.validate()?;
        }
        Ok(())
    }
}

/// Read an archive file and decode it to text.
pub fn read_archive(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CompactError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|e| CompactError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read archive");
    Ok(decode_archive(&bytes))
}

/// Parse an archive and summarize its thread.
pub fn summarize_archive(raw: &str, options: &CompactOptions) -> ThreadSummary {
    let messages = parse_archive(raw);
    debug!(messages = messages.len(), "Parsed archive for summary");
    summarize_messages(messages, options)
}

/// Summarize already parsed messages, e.g. gathered from several archives.
pub fn summarize_messages(messages: Vec<Message>, options: &CompactOptions) -> ThreadSummary {
    let summary = build_thread_summary(messages, &options.summary);
    match &options.token_budget {
        Some(budget) => apply_token_budget_to_thread_summary(summary, budget),
        None => summary,
    }
}

/// Parse an archive and aggregate its patch series, if any.
pub fn patchset_from_archive(raw: &str, options: &CompactOptions) -> Option<Patchset> {
    patchset_from_messages(parse_archive(raw), options)
}

/// Aggregate the patch series in already parsed messages.
pub fn patchset_from_messages(messages: Vec<Message>, options: &CompactOptions) -> Option<Patchset> {
    let parsed = messages.len();
    let unique = dedupe_messages(messages);
    debug!(parsed, unique = unique.len(), "Deduplicated messages for patchset");

    let patchset = build_patchset(&unique, &options.patchset)?;
    Some(match &options.token_budget {
        Some(budget) => apply_token_budget_to_patchset(patchset, budget),
        None => patchset,
    })
}

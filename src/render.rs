//! Plain-text rendering for terminal output.

use humansize::{format_size, BINARY};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::model::diff::DiffStat;
use crate::model::message::Message;
use crate::model::patchset::Patchset;
use crate::model::summary::{NormalizedThreadSummary, ThreadSummary};
use crate::parser::header::decode_encoded_words;

const FROM_WIDTH: usize = 28;
const SUBJECT_WIDTH: usize = 52;
const RULE_WIDTH: usize = 98;

/// Truncate a string to fit within `max_width` columns, adding "..." if needed.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    let width = UnicodeWidthStr::width(s);
    if width <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let mut result = String::new();
        let mut current_width = 0;
        for ch in s.chars() {
            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
            if current_width + ch_width + 3 > max_width {
                break;
            }
            result.push(ch);
            current_width += ch_width;
        }
        result.push_str("...");
        result
    }
}

/// Left-align `s` in a column of `width` display cells.
fn pad(s: &str, width: usize) -> String {
    let truncated = truncate_str(s, width);
    let fill = width.saturating_sub(UnicodeWidthStr::width(truncated.as_str()));
    format!("{truncated}{}", " ".repeat(fill))
}

/// One row per parsed message: index, sender, subject, body size.
pub fn render_messages(messages: &[Message]) -> String {
    let mut lines = vec![
        String::new(),
        format!("  {} message(s)", messages.len()),
        String::new(),
    ];
    if messages.is_empty() {
        return lines.join("\n");
    }

    lines.push(format!(
        "  {:<4} {} {} {:>10}",
        "#",
        pad("From", FROM_WIDTH),
        pad("Subject", SUBJECT_WIDTH),
        "Body"
    ));
    lines.push(format!("  {}", "-".repeat(RULE_WIDTH)));

    for (i, msg) in messages.iter().enumerate() {
        let from = decode_encoded_words(msg.header("from").unwrap_or_default());
        let subject = decode_encoded_words(msg.subject());
        lines.push(format!(
            "  {:<4} {} {} {:>10}",
            i + 1,
            pad(&from, FROM_WIDTH),
            pad(&subject, SUBJECT_WIDTH),
            format_size(msg.body.len(), BINARY)
        ));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Thread summary as a readable transcript.
pub fn render_summary(summary: &ThreadSummary) -> String {
    let mut lines = vec![format!(
        "{} message(s), {} shown{}",
        summary.message_count,
        summary.items.len(),
        if summary.truncated { " (truncated)" } else { "" }
    )];

    for item in &summary.items {
        lines.push(String::new());
        lines.push(format!(
            "[{}] {}",
            item.kind.as_str(),
            truncate_str(&item.subject, RULE_WIDTH)
        ));
        let mut meta = format!("  From: {}", item.from);
        if let Some(date) = &item.date {
            meta.push_str(&format!("  Date: {date}"));
        }
        lines.push(meta);
        if let Some(id) = &item.message_id {
            lines.push(format!("  Message-ID: <{id}>"));
        }
        if !item.body.is_empty() {
            lines.push(String::new());
            lines.extend(item.body.lines().map(|l| format!("    {l}")));
        }
        for trailer in &item.trailers {
            lines.push(format!("  {}", trailer.raw_line));
        }
    }
    lines.join("\n")
}

/// Pooled summary: subject and participant tables, then the items.
pub fn render_normalized_summary(summary: &NormalizedThreadSummary) -> String {
    let mut lines = vec!["Subjects:".to_string()];
    lines.extend(
        summary
            .subjects
            .iter()
            .enumerate()
            .map(|(i, s)| format!("  s{i:<3} {s}")),
    );
    lines.push("Participants:".to_string());
    lines.extend(
        summary
            .participants
            .iter()
            .enumerate()
            .map(|(i, p)| format!("  p{i:<3} {p}")),
    );

    for item in &summary.items {
        lines.push(String::new());
        lines.push(format!(
            "[{}] s{} p{}{}",
            item.kind.as_str(),
            item.subject,
            item.from,
            item.date.as_deref().map(|d| format!(" {d}")).unwrap_or_default()
        ));
        lines.extend(item.body.lines().map(|l| format!("    {l}")));
    }
    lines.join("\n")
}

fn stat_lines(stat: &DiffStat, indent: &str) -> Vec<String> {
    let mut lines: Vec<String> = stat
        .per_file
        .iter()
        .map(|f| {
            format!(
                "{indent}{} | +{} -{}",
                pad(&f.file, SUBJECT_WIDTH),
                f.insertions,
                f.deletions
            )
        })
        .collect();
    lines.push(format!(
        "{indent}{} file(s) changed, {} insertion(s)(+), {} deletion(s)(-)",
        stat.files, stat.insertions, stat.deletions
    ));
    lines
}

/// Patch series overview: cover letter, per-patch stats and diffs, totals.
pub fn render_patchset(patchset: &Patchset) -> String {
    let series = &patchset.series;
    let mut header = format!("Series: {}", series.subject);
    if let Some(version) = &series.version {
        header.push_str(&format!(" ({version})"));
    }
    let mut lines = vec![header];
    if let Some(parts) = &series.parts {
        lines.push(format!("Parts: {} of {}", parts.index, parts.total));
    }

    if let Some(cover) = &patchset.cover_letter {
        lines.push(String::new());
        lines.push(format!("Cover: {}", cover.subject));
        lines.extend(cover.body.lines().map(|l| format!("    {l}")));
    }

    for (i, patch) in patchset.patches.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{:>3}. {}", i + 1, patch.subject));
        for trailer in &patch.trailers {
            lines.push(format!("     {}", trailer.raw_line));
        }
        if let Some(stat) = &patch.diff_stat {
            lines.extend(stat_lines(stat, "     "));
        }
        for diff in patch.diffs.iter().flatten() {
            lines.push(String::new());
            lines.extend(diff.lines().map(|l| format!("     {l}")));
        }
    }

    lines.push(String::new());
    lines.push("Total:".to_string());
    lines.extend(stat_lines(&patchset.aggregate, "  "));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::diff::FileStat;
    use crate::model::message::PatchKind;
    use crate::model::patchset::{PatchEntry, Series};
    use crate::model::summary::SummaryItem;
    use crate::parser::parse_message;

    #[test]
    fn test_truncate_str_ascii() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hello", 2), "he");
    }

    #[test]
    fn test_truncate_str_wide_chars() {
        // Each CJK char is two columns.
        let out = truncate_str("日本語のテキスト", 9);
        assert_eq!(out, "日本語...");
        assert!(UnicodeWidthStr::width(out.as_str()) <= 9);
    }

    #[test]
    fn test_render_messages_table() {
        let msg = parse_message("From: Ann <ann@x>\nSubject: hello\n\nbody");
        let out = render_messages(&[msg]);
        assert!(out.contains("1 message(s)"));
        assert!(out.contains("Ann <ann@x>"));
        assert!(out.contains("4 B"));
    }

    #[test]
    fn test_render_summary() {
        let summary = ThreadSummary {
            message_count: 3,
            truncated: true,
            items: vec![SummaryItem {
                message_id: Some("a@x".into()),
                url: None,
                from: "Ann".into(),
                subject: "Re: hi".into(),
                date: None,
                kind: PatchKind::Reply,
                body: "line one\nline two".into(),
                trailers: Vec::new(),
            }],
        };
        let out = render_summary(&summary);
        assert!(out.starts_with("3 message(s), 1 shown (truncated)"));
        assert!(out.contains("[reply] Re: hi"));
        assert!(out.contains("    line two"));
    }

    #[test]
    fn test_render_patchset_totals() {
        let stat = DiffStat::from_per_file(vec![FileStat {
            file: "a.c".into(),
            insertions: 2,
            deletions: 1,
        }]);
        let patchset = Patchset {
            series: Series {
                subject: "fix".into(),
                version: Some("v2".into()),
                parts: None,
            },
            cover_letter: None,
            patches: vec![PatchEntry {
                subject: "[PATCH v2] fix".into(),
                message_id: None,
                url: None,
                diff_stat: Some(stat.clone()),
                diffs: None,
                trailers: Vec::new(),
            }],
            aggregate: stat,
        };
        let out = render_patchset(&patchset);
        assert!(out.starts_with("Series: fix (v2)"));
        assert!(out.contains("  1. [PATCH v2] fix"));
        assert!(out.contains("1 file(s) changed, 2 insertion(s)(+), 1 deletion(s)(-)"));
    }
}

//! Subject parsing and message classification for patch discussions.
//!
//! Subjects follow the `git format-patch` conventions:
//! - `[PATCH 2/5] Fix memory leak`
//! - `[PATCH v2 3/10] Add new feature`
//! - `[RFC PATCH net-next v3 0/5] Cover letter`
//! - `[PATCHv2] Single patch, no numbering`

use std::sync::OnceLock;

use regex::Regex;

use crate::model::message::{Message, PatchKind};
use crate::model::patchset::PatchSubjectTag;

/// Reply/forward prefixes removed by [`normalize_subject`].
const REPLY_PREFIXES: [&str; 5] = ["re:", "fwd:", "aw:", "sv:", "antw:"];

static PATCH_BRACKET: OnceLock<Regex> = OnceLock::new();
static VERSION: OnceLock<Regex> = OnceLock::new();
static PART: OnceLock<Regex> = OnceLock::new();
static COVER_INDEX: OnceLock<Regex> = OnceLock::new();
static ANY_BRACKET: OnceLock<Regex> = OnceLock::new();

/// `[...PATCH...]`, capturing the bracket contents.
fn patch_bracket_regex() -> &'static Regex {
    PATCH_BRACKET.get_or_init(|| {
        Regex::new(r"(?i)\[([^\[\]]*\bpatch[^\[\]]*)\]").expect("valid patch bracket regex")
    })
}

fn version_regex() -> &'static Regex {
    VERSION.get_or_init(|| Regex::new(r"(?i)(?:\bv|patchv)(\d+)\b").expect("valid version regex"))
}

fn part_regex() -> &'static Regex {
    PART.get_or_init(|| Regex::new(r"(\d+)\s*/\s*(\d+)").expect("valid part regex"))
}

/// `0/n` with any number of leading zeros, not preceded by another digit.
fn cover_index_regex() -> &'static Regex {
    COVER_INDEX.get_or_init(|| Regex::new(r"(?:^|\D)0+/\d+").expect("valid cover regex"))
}

fn any_bracket_regex() -> &'static Regex {
    ANY_BRACKET.get_or_init(|| Regex::new(r"\[[^\]]*\]").expect("valid bracket regex"))
}

/// Whether any line of the body starts a git diff.
pub fn has_diff(body: &str) -> bool {
    body.lines().any(|line| line.starts_with("diff --git "))
}

/// Classify a message as cover letter, patch, or reply.
pub fn detect_patch_kind(msg: &Message) -> PatchKind {
    let subject = msg.subject().to_lowercase();

    match patch_bracket_regex().captures(&subject) {
        Some(caps) if cover_index_regex().is_match(&caps[1]) => PatchKind::Cover,
        Some(_) => PatchKind::Patch,
        None if has_diff(&msg.body) => PatchKind::Patch,
        None => PatchKind::Reply,
    }
}

/// Parse the `[... PATCH vN i/total]` tag of a subject.
///
/// Without a patch tag the whole subject becomes `base`.
pub fn parse_patch_subject(subject: &str) -> PatchSubjectTag {
    let Some((whole, inner)) = patch_bracket_regex()
        .captures(subject)
        .and_then(|caps| Some((caps.get(0)?, caps.get(1)?.as_str())))
    else {
        return PatchSubjectTag {
            base: subject.to_string(),
            ..Default::default()
        };
    };

    let version = version_regex()
        .captures(inner)
        .map(|c| format!("v{}", &c[1]));

    let (index, total) = match part_regex().captures(inner) {
        Some(c) => (c[1].parse().ok(), c[2].parse().ok()),
        None => (None, None),
    };

    let before = subject[..whole.start()].trim();
    let after = subject[whole.end()..].trim();
    let base = match (before.is_empty(), after.is_empty()) {
        (true, _) => after.to_string(),
        (false, true) => before.to_string(),
        (false, false) => format!("{before} {after}"),
    };

    PatchSubjectTag {
        base,
        version,
        index,
        total,
    }
}

/// Normalize a subject for grouping and display.
///
/// Strips `Re:`/`Fwd:`/`Aw:`/`Sv:`/`Antw:` prefixes until none remain,
/// removes every bracket tag, and collapses whitespace.
///
/// `"Re: AW: [PATCH v2 1/3]  Add   feature"` → `"Add feature"`
pub fn normalize_subject(subject: &str) -> String {
    let mut rest = subject.trim_start();
    while let Some(prefix) = REPLY_PREFIXES.iter().find(|p| {
        rest.get(..p.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(p))
    }) {
        rest = rest[prefix.len()..].trim_start();
    }

    let without_tags = any_bracket_regex().replace_all(rest, " ");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Reply-quote, attribution, and signature stripping.
//!
//! A single pass over the body driven by a three-state automaton. Each line
//! is classified first, then [`transition`] decides what happens to it.

use std::sync::OnceLock;

use regex::Regex;

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripState {
    Normal,
    /// After an attribution line, until the first substantive line.
    InQuoteBlock,
    /// Between PGP signature armor lines.
    InSignature,
}

/// What a single line looks like, independent of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Quoted,
    Attribution,
    PgpBegin,
    PgpEnd,
    SignatureSeparator,
    Blank,
    Text,
}

/// What to do with the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Emit,
    Drop,
    /// Drop this line and every following one.
    Stop,
}

static ATTRIBUTION: OnceLock<Regex> = OnceLock::new();
static UNDERSCORE_RULE: OnceLock<Regex> = OnceLock::new();
static OUTLOOK_FOLLOWER: OnceLock<Regex> = OnceLock::new();

fn attribution_regex() -> &'static Regex {
    ATTRIBUTION.get_or_init(|| Regex::new(r"^\s*On .+ wrote:\s*$").expect("valid attribution regex"))
}

fn underscore_rule_regex() -> &'static Regex {
    UNDERSCORE_RULE.get_or_init(|| Regex::new(r"^\s*_{3,}\s*$").expect("valid underscore regex"))
}

fn outlook_follower_regex() -> &'static Regex {
    OUTLOOK_FOLLOWER
        .get_or_init(|| Regex::new(r"^\s*(?:Sent|To|Subject):").expect("valid outlook regex"))
}

fn classify(line: &str, next: Option<&str>) -> LineKind {
    let trimmed = line.trim();
    if line.starts_with('>') {
        LineKind::Quoted
    } else if trimmed == "-----BEGIN PGP SIGNATURE-----" {
        LineKind::PgpBegin
    } else if trimmed == "-----END PGP SIGNATURE-----" {
        LineKind::PgpEnd
    } else if line.trim_end() == "--" {
        LineKind::SignatureSeparator
    } else if is_attribution(line, next) {
        LineKind::Attribution
    } else if trimmed.is_empty() {
        LineKind::Blank
    } else {
        LineKind::Text
    }
}

fn is_attribution(line: &str, next: Option<&str>) -> bool {
    if attribution_regex().is_match(line)
        || line.contains("-----Original Message-----")
        || underscore_rule_regex().is_match(line)
    {
        return true;
    }
    line.trim_start().starts_with("From:")
        && next.is_some_and(|n| outlook_follower_regex().is_match(n))
}

/// State transition table.
///
/// `diff_follows` is the lookahead for the signature separator rule: a `--`
/// line only ends the scan when no inline diff follows it. The lookahead
/// matches `diff --git ` anywhere in a later line, quoted lines included.
fn transition(state: StripState, kind: LineKind, diff_follows: bool) -> (StripState, Action) {
    use Action::*;
    use LineKind::*;
    use StripState::*;

    match (state, kind) {
        (InSignature, PgpEnd) => (Normal, Drop),
        (InSignature, _) => (InSignature, Drop),
        (_, Quoted) => (state, Drop),
        (_, PgpBegin) => (InSignature, Drop),
        (_, Attribution) => (InQuoteBlock, Drop),
        (_, SignatureSeparator) if diff_follows => (state, Drop),
        (_, SignatureSeparator) => (state, Stop),
        (InQuoteBlock, Blank) => (InQuoteBlock, Drop),
        (InQuoteBlock, _) => (Normal, Emit),
        (Normal, _) => (Normal, Emit),
    }
}

/// Remove quoted replies, attributions, boilerplate rules, and signatures.
///
/// Lines are rejoined with `\n`.
pub fn strip_quoted(body: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let mut state = StripState::Normal;
    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        let kind = classify(line, lines.get(i + 1).copied());
        let diff_follows = kind == LineKind::SignatureSeparator
            && lines[i + 1..].iter().any(|l| l.contains("diff --git "));

        let (next_state, action) = transition(state, kind, diff_follows);
        state = next_state;
        match action {
            Action::Emit => kept.push(line),
            Action::Drop => {}
            Action::Stop => break,
        }
    }

    kept.join("\n")
}

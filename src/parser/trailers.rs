//! Commit trailer extraction (`Signed-off-by:`, `Reviewed-by:`, ...).

use crate::model::message::TrailerLine;

/// Trailer keys worth keeping, compared case-insensitively.
const TRAILER_KEYS: &[&str] = &[
    "signed-off-by",
    "reviewed-by",
    "acked-by",
    "tested-by",
    "fixes",
    "reported-by",
    "suggested-by",
    "co-developed-by",
    "cc",
    "link",
];

/// Extract allow-listed trailers from a message body, in order.
///
/// Scanning stops at the `---` line that ends a patch description, or at the
/// first diff, so `Cc:` lines inside diff context are never picked up.
pub fn extract_trailers(body: &str) -> Vec<TrailerLine> {
    let mut trailers = Vec::new();

    for line in body.lines() {
        if line.starts_with("diff --git ") || line.trim_end() == "---" {
            break;
        }
        if let Some(trailer) = parse_trailer(line) {
            trailers.push(trailer);
        }
    }

    trailers
}

fn parse_trailer(line: &str) -> Option<TrailerLine> {
    let trimmed = line.trim();
    let (key, value) = trimmed.split_once(':')?;
    let value = value.trim();
    if value.is_empty() || !is_trailer_key(key) {
        return None;
    }
    Some(TrailerLine {
        key: key.to_string(),
        value: value.to_string(),
        raw_line: trimmed.to_string(),
    })
}

fn is_trailer_key(key: &str) -> bool {
    TRAILER_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_allow_listed_keys_in_order() {
        let body = "Fix the thing.\n\nReported-by: A <a@x>\nSigned-off-by: B <b@x>\nX-Random: no\n";
        let trailers = extract_trailers(body);
        assert_eq!(trailers.len(), 2);
        assert_eq!(trailers[0].key, "Reported-by");
        assert_eq!(trailers[0].value, "A <a@x>");
        assert_eq!(trailers[1].raw_line, "Signed-off-by: B <b@x>");
    }

    #[test]
    fn test_key_case_is_preserved() {
        let trailers = extract_trailers("signed-off-by: lower <l@x>");
        assert_eq!(trailers[0].key, "signed-off-by");
    }

    #[test]
    fn test_stops_at_patch_separator() {
        let body = "msg\n\nSigned-off-by: A <a@x>\n---\n Cc: not-a-trailer\ndiff --git a/f b/f\n";
        let trailers = extract_trailers(body);
        assert_eq!(trailers.len(), 1);
    }

    #[test]
    fn test_empty_value_is_skipped() {
        assert!(extract_trailers("Fixes:\n").is_empty());
    }
}

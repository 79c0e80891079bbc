//! Hunk-based truncation of a single diff block.

/// Keep the file header, at most `max_hunks_per_file` hunks, and at most
/// `max_hunk_lines` lines after each hunk header.
///
/// Header lines (`diff --git`, `index`, `---`, `+++`) are always kept.
/// Everything from the first hunk past the limit onwards is dropped.
pub fn truncate_by_hunks(block: &str, max_hunks_per_file: usize, max_hunk_lines: usize) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut hunks_seen = 0usize;
    let mut lines_in_hunk: Option<usize> = None;

    for line in block.lines() {
        if line.starts_with("@@ ") {
            hunks_seen += 1;
            if hunks_seen > max_hunks_per_file {
                break;
            }
            out.push(line);
            lines_in_hunk = Some(0);
            continue;
        }

        match lines_in_hunk.as_mut() {
            Some(count) => {
                if *count < max_hunk_lines {
                    out.push(line);
                    *count += 1;
                }
            }
            None if is_file_header(line) => out.push(line),
            None => {}
        }
    }

    out.join("\n")
}

fn is_file_header(line: &str) -> bool {
    line.starts_with("diff --git ")
        || line.starts_with("index ")
        || line.starts_with("--- ")
        || line.starts_with("+++ ")
}

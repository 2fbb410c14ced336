// ErrHarvest - app/tail.rs
//
// Growth check for the active error log.
//
// The whole file is re-read each cycle and counted in lines, rather than
// seeking to a byte offset. That keeps the resume position a plain line
// count that survives re-encoding and partial writes, at O(file size) per
// cycle. Daily files are bounded, and files above LARGE_FILE_WARN_BYTES
// log a warning so the cost stays visible.
//
// Error handling:
//   - A file that vanished or cannot be read returns `TailError`; the caller
//     treats the cycle as a no-op and leaves the position untouched.
//   - Fewer lines than recorded (truncation or rewrite in place) is reported
//     as `Unchanged`, never as growth, so the position cannot move backwards.

use crate::platform::fs::{read_file_lossy, split_lines_keep_ends};
use crate::util::constants::LARGE_FILE_WARN_BYTES;
use crate::util::error::TailError;
use std::path::Path;

/// Result of comparing a file's current line count with the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailOutcome {
    /// The file has more lines than recorded. `lines` is the full content,
    /// each line with its terminator; `line_count == lines.len()`.
    Grown { lines: Vec<String>, line_count: u64 },

    /// Same or fewer lines than recorded. Do not advance the position.
    Unchanged { line_count: u64 },
}

impl TailOutcome {
    pub fn is_grown(&self) -> bool {
        matches!(self, Self::Grown { .. })
    }
}

/// Check `path` for lines beyond `last_line_count`.
pub fn tail(path: &Path, last_line_count: u64) -> Result<TailOutcome, TailError> {
    if let Ok(meta) = std::fs::metadata(path) {
        if meta.len() > LARGE_FILE_WARN_BYTES {
            tracing::warn!(
                file = %path.display(),
                bytes = meta.len(),
                threshold = LARGE_FILE_WARN_BYTES,
                "Active log is large; each cycle re-reads it in full"
            );
        }
    }

    let content =
        read_file_lossy(path).map_err(|e| TailError::from_io(path.to_path_buf(), e))?;
    let lines = split_lines_keep_ends(&content);
    let line_count = lines.len() as u64;

    if line_count > last_line_count {
        tracing::debug!(
            file = %path.display(),
            previous = last_line_count,
            current = line_count,
            "Tail: new lines"
        );
        Ok(TailOutcome::Grown { lines, line_count })
    } else {
        if line_count < last_line_count {
            tracing::info!(
                file = %path.display(),
                recorded = last_line_count,
                current = line_count,
                "Tail: file has fewer lines than recorded; holding position"
            );
        }
        Ok(TailOutcome::Unchanged { line_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_grown_returns_all_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors_2025-01-01.log");
        fs::write(&path, "a\nb\nc\n").unwrap();

        match tail(&path, 1).unwrap() {
            TailOutcome::Grown { lines, line_count } => {
                assert_eq!(line_count, 3);
                assert_eq!(lines, vec!["a\n", "b\n", "c\n"]);
            }
            other => panic!("expected Grown, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_last_line_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.log");
        fs::write(&path, "a\nb").unwrap();
        assert!(matches!(
            tail(&path, 0).unwrap(),
            TailOutcome::Grown { line_count: 2, .. }
        ));
    }

    #[test]
    fn test_equal_count_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.log");
        fs::write(&path, "a\nb\n").unwrap();
        assert_eq!(
            tail(&path, 2).unwrap(),
            TailOutcome::Unchanged { line_count: 2 }
        );
    }

    #[test]
    fn test_truncated_file_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.log");
        fs::write(&path, "a\n").unwrap();
        let outcome = tail(&path, 10).unwrap();
        assert!(!outcome.is_grown());
        assert_eq!(outcome, TailOutcome::Unchanged { line_count: 1 });
    }

    #[test]
    fn test_empty_file_is_unchanged_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.log");
        fs::write(&path, "").unwrap();
        assert_eq!(
            tail(&path, 0).unwrap(),
            TailOutcome::Unchanged { line_count: 0 }
        );
    }

    #[test]
    fn test_missing_file_is_tail_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.log");
        assert!(matches!(tail(&path, 0), Err(TailError::NotFound { .. })));
    }
}

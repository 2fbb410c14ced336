// ErrHarvest - core/locator.rs
//
// Finds the newest dated error log in the watched folder.
//
// Architecture note: this module uses `walkdir` for the directory listing as
// an OS abstraction, restricted to the folder itself (no recursion). It reads
// only directory entries, never file contents.
//
// Ordering: names follow `errors_YYYY-MM-DD.log` with fixed-width fields, so
// the lexicographically greatest name is the most recent day.

use crate::core::model::LocatedFile;
use crate::util::constants::ERROR_LOG_FILE_PATTERN;
use crate::util::error::LocateError;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn file_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ERROR_LOG_FILE_PATTERN).expect("locate: invalid file regex"))
}

/// Returns true if `name` is a dated error log filename.
pub fn is_error_log_name(name: &str) -> bool {
    file_name_regex().is_match(name)
}

/// List every dated error log directly inside `dir`, newest first.
///
/// # Fatal errors
/// Returns `Err` if `dir` does not exist, is not a directory, or cannot be
/// listed. An empty result is not an error here; see `locate_latest`.
pub fn list_error_logs(dir: &Path) -> Result<Vec<LocatedFile>, LocateError> {
    // `fs::metadata()` rather than `Path::is_dir()` so a missing folder and a
    // plain file are reported differently.
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(LocateError::NotADirectory {
                path: dir.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(LocateError::DirectoryNotFound {
                path: dir.to_path_buf(),
            })
        }
    }

    let mut files = Vec::new();
    for item in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
        let item = item.map_err(|source| LocateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        if !item.file_type().is_file() {
            continue;
        }

        // Non-UTF-8 names can never match the ASCII pattern.
        let Some(name) = item.file_name().to_str() else {
            continue;
        };

        if is_error_log_name(name) {
            files.push(LocatedFile {
                name: name.to_string(),
                path: item.path().to_path_buf(),
            });
        }
    }

    files.sort_by(|a, b| b.name.cmp(&a.name));

    tracing::debug!(
        dir = %dir.display(),
        matches = files.len(),
        "Listed dated error logs"
    );

    Ok(files)
}

/// Return the newest dated error log in `dir`.
///
/// No matching file is fatal for the cycle (`LocateError::NoCandidate`).
pub fn locate_latest(dir: &Path) -> Result<LocatedFile, LocateError> {
    list_error_logs(dir)?
        .into_iter()
        .next()
        .ok_or_else(|| LocateError::NoCandidate {
            path: dir.to_path_buf(),
        })
}

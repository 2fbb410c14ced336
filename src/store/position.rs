// ErrHarvest - store/position.rs
//
// Resume positions per dated log file.
//
// Design principles:
// - One record per filename, never deleted. `is_done` marks files that a
//   newer dated file has superseded.
// - The JSON store writes atomically (write temp, rename) after every
//   mutation, so a crash never leaves a half-written document.
// - Unlike a UI session, a corrupt or incompatible store is an error rather
//   than a silent fresh start: starting over at line 0 would re-deliver the
//   whole active file.

use crate::core::model::FileState;
use crate::platform::fs::write_atomic;
use crate::util::constants::STATE_VERSION;
use crate::util::error::StoreError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Record store consumed by the pipeline.
///
/// The pipeline reads the active file's record once per cycle and writes it
/// at most once; it never reads another file's position.
pub trait PositionStore {
    /// Fetch the record for `filename`, if one exists.
    fn get(&self, filename: &str) -> Result<Option<FileState>, StoreError>;

    /// Insert or fully replace the record for `filename`.
    fn upsert(
        &mut self,
        filename: &str,
        filepath: &Path,
        last_line_read: u64,
        is_done: bool,
    ) -> Result<(), StoreError>;

    /// Flag `filename` as superseded, leaving its position untouched.
    /// A missing record is a logged no-op.
    fn mark_done(&mut self, filename: &str) -> Result<(), StoreError>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Store kept only in process memory. Positions are lost on exit.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: BTreeMap<String, FileState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, ordered by filename.
    pub fn records(&self) -> impl Iterator<Item = &FileState> {
        self.records.values()
    }
}

impl PositionStore for MemoryStore {
    fn get(&self, filename: &str) -> Result<Option<FileState>, StoreError> {
        Ok(self.records.get(filename).cloned())
    }

    fn upsert(
        &mut self,
        filename: &str,
        filepath: &Path,
        last_line_read: u64,
        is_done: bool,
    ) -> Result<(), StoreError> {
        upsert_record(&mut self.records, filename, filepath, last_line_read, is_done);
        Ok(())
    }

    fn mark_done(&mut self, filename: &str) -> Result<(), StoreError> {
        mark_record_done(&mut self.records, filename);
        Ok(())
    }
}

// =============================================================================
// JSON file store
// =============================================================================

/// On-disk document shape.
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    /// Schema version; must equal `STATE_VERSION` to be accepted.
    version: u32,

    #[serde(default)]
    files: BTreeMap<String, FileState>,
}

/// Store persisted as a single JSON document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: BTreeMap<String, FileState>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store (first run);
    /// the file is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No position store yet; starting empty");
                return Ok(Self {
                    path,
                    records: BTreeMap::new(),
                });
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path,
                    operation: "read",
                    source,
                })
            }
        };

        let doc: StateDocument =
            serde_json::from_str(&content).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;

        if doc.version != STATE_VERSION {
            return Err(StoreError::VersionMismatch {
                path,
                found: doc.version,
                expected: STATE_VERSION,
            });
        }

        tracing::info!(
            path = %path.display(),
            records = doc.files.len(),
            "Position store loaded"
        );

        Ok(Self {
            path,
            records: doc.files,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        let doc = StateDocument {
            version: STATE_VERSION,
            files: self.records.clone(),
        };
        let json = serde_json::to_string_pretty(&doc).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        write_atomic(&self.path, json.as_bytes()).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            operation: "write",
            source,
        })?;

        tracing::trace!(path = %self.path.display(), "Position store saved");
        Ok(())
    }
}

impl PositionStore for JsonFileStore {
    fn get(&self, filename: &str) -> Result<Option<FileState>, StoreError> {
        Ok(self.records.get(filename).cloned())
    }

    fn upsert(
        &mut self,
        filename: &str,
        filepath: &Path,
        last_line_read: u64,
        is_done: bool,
    ) -> Result<(), StoreError> {
        let previous = self.records.get(filename).cloned();
        upsert_record(&mut self.records, filename, filepath, last_line_read, is_done);
        self.save().map_err(|e| {
            // Keep memory in step with disk so a retry sees the old record.
            match previous {
                Some(old) => {
                    self.records.insert(filename.to_string(), old);
                }
                None => {
                    self.records.remove(filename);
                }
            }
            e
        })
    }

    fn mark_done(&mut self, filename: &str) -> Result<(), StoreError> {
        let Some(old) = self.records.get(filename).cloned() else {
            mark_record_done(&mut self.records, filename);
            return Ok(());
        };
        mark_record_done(&mut self.records, filename);
        self.save().map_err(|e| {
            self.records.insert(filename.to_string(), old);
            e
        })
    }
}

// =============================================================================
// Shared record mutations
// =============================================================================

fn upsert_record(
    records: &mut BTreeMap<String, FileState>,
    filename: &str,
    filepath: &Path,
    last_line_read: u64,
    is_done: bool,
) {
    let existed = records.contains_key(filename);
    records.insert(
        filename.to_string(),
        FileState {
            filename: filename.to_string(),
            filepath: filepath.to_path_buf(),
            last_line_read,
            is_done,
            updated_at: Some(Utc::now()),
        },
    );
    tracing::debug!(
        filename,
        last_line_read,
        is_done,
        inserted = !existed,
        "Position record written"
    );
}

fn mark_record_done(records: &mut BTreeMap<String, FileState>, filename: &str) {
    match records.get_mut(filename) {
        Some(state) => {
            state.is_done = true;
            state.updated_at = Some(Utc::now());
            tracing::info!(filename, last_line_read = state.last_line_read, "File marked done");
        }
        None => {
            tracing::warn!(filename, "No position record to mark done");
        }
    }
}

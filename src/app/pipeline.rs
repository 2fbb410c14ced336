// ErrHarvest - app/pipeline.rs
//
// One harvest cycle: locate -> rollover -> tail -> split -> parse -> persist
// -> record position.
//
// Architecture:
//   - `Pipeline` owns the active-file state, the position store, and the
//     entry sink. The runner calls `run_cycle` once per interval; cycles
//     never overlap, so no locking is needed around the position record.
//   - The active file starts unknown at process start and is re-derived from
//     the position store on the first cycle.
//
// Failure rules:
//   - Locate and tail failures abort the cycle before any position write.
//   - A sink failure leaves the position where it was, so the same lines are
//     offered again next cycle (at-least-once delivery).
//   - A grown file that yields no valid entries still advances the position,
//     otherwise unparseable lines would be rescanned forever.

use crate::app::tail::{self, TailOutcome};
use crate::core::locator;
use crate::core::model::{CycleReport, LocatedFile, LogEntry};
use crate::core::parser::parse_entry;
use crate::core::splitter::split_entries;
use crate::store::position::PositionStore;
use crate::store::sink::EntrySink;
use crate::util::error::Result;
use std::path::PathBuf;

/// Static settings for a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Folder holding the `errors_YYYY-MM-DD.log` files.
    pub folder: PathBuf,
    /// Stamped into every entry's `Server` field.
    pub server_name: String,
}

/// Which file the pipeline currently harvests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveFile {
    /// Nothing chosen yet (fresh process).
    #[default]
    Unset,
    /// Harvesting this filename.
    Named(String),
}

impl ActiveFile {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Unset => None,
            Self::Named(name) => Some(name.as_str()),
        }
    }
}

/// Incremental harvester over one watched folder.
pub struct Pipeline<P, S> {
    config: PipelineConfig,
    active: ActiveFile,
    store: P,
    sink: S,
}

impl<P: PositionStore, S: EntrySink> Pipeline<P, S> {
    pub fn new(config: PipelineConfig, store: P, sink: S) -> Self {
        Self {
            config,
            active: ActiveFile::Unset,
            store,
            sink,
        }
    }

    pub fn active(&self) -> &ActiveFile {
        &self.active
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Run one cycle. On `Err` no position was advanced for this cycle
    /// (a rollover performed before the failure stays recorded).
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        let latest = locator::locate_latest(&self.config.folder)?;
        let retired = self.switch_to(&latest)?;

        // Missing only if the active file's record vanished from the store.
        let last_line_read = match self.store.get(&latest.name)? {
            Some(state) => state.last_line_read,
            None => {
                self.store.upsert(&latest.name, &latest.path, 0, false)?;
                0
            }
        };

        let outcome = tail::tail(&latest.path, last_line_read)?;

        let (lines, line_count) = match outcome {
            TailOutcome::Unchanged { .. } => {
                return Ok(CycleReport {
                    filename: latest.name,
                    path: latest.path,
                    grown: false,
                    last_line_read,
                    new_entries: 0,
                    retired,
                });
            }
            TailOutcome::Grown { lines, line_count } => (lines, line_count),
        };

        let entries = self.extract(&lines, last_line_read);

        if !entries.is_empty() {
            self.sink.persist(&entries)?;
        } else {
            tracing::debug!(
                file = %latest.name,
                from = last_line_read,
                to = line_count,
                "No valid entries in new lines; advancing anyway"
            );
        }

        self.store
            .upsert(&latest.name, &latest.path, line_count, false)?;

        Ok(CycleReport {
            filename: latest.name,
            path: latest.path,
            grown: true,
            last_line_read: line_count,
            new_entries: entries.len(),
            retired,
        })
    }

    /// Apply the rollover rules for the newest file. Returns the name of the
    /// file that was retired, if any.
    fn switch_to(&mut self, latest: &LocatedFile) -> Result<Option<String>> {
        if self.active.name() == Some(latest.name.as_str()) {
            return Ok(None);
        }

        let retired = match &self.active {
            ActiveFile::Named(previous) => {
                self.store.mark_done(previous)?;
                Some(previous.clone())
            }
            ActiveFile::Unset => None,
        };

        match self.store.get(&latest.name)? {
            Some(state) => {
                tracing::info!(
                    file = %latest.name,
                    last_line_read = state.last_line_read,
                    "Resuming from stored position"
                );
            }
            None => {
                self.store.upsert(&latest.name, &latest.path, 0, false)?;
                tracing::info!(file = %latest.name, "Tracking new log file");
            }
        }

        if let Some(previous) = &retired {
            tracing::info!(from = %previous, to = %latest.name, "Rolled over to newer log file");
        }

        self.active = ActiveFile::Named(latest.name.clone());
        Ok(retired)
    }

    /// Split the new lines into blocks and keep the ones that parse.
    fn extract(&self, lines: &[String], start_line: u64) -> Vec<LogEntry> {
        // Positions beyond usize::MAX cannot index `lines` anyway.
        let start = usize::try_from(start_line).unwrap_or(usize::MAX);
        let blocks = split_entries(lines, start);
        let block_count = blocks.len();

        let entries: Vec<LogEntry> = blocks
            .iter()
            .filter_map(|block| parse_entry(block, &self.config.server_name))
            .collect();

        if entries.len() < block_count {
            tracing::debug!(
                blocks = block_count,
                valid = entries.len(),
                "Dropped blocks with unrecognised headers"
            );
        }

        entries
    }
}

// ErrHarvest - store/sink.rs
//
// Destinations for harvested entries. The pipeline hands each cycle's
// entries over as one batch and only advances the position after the sink
// reports success.
//
// File sinks render the whole batch in memory first and append it with a
// single write, so a serialisation failure never leaves half a batch on
// disk. A failure during the write itself may still leave a partial batch;
// the position is not advanced in that case and the batch is re-delivered,
// so consumers must tolerate duplicates.

use crate::core::model::LogEntry;
use crate::util::error::SinkError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Receiver of harvested entries.
pub trait EntrySink {
    /// Persist one batch. Returns the number of entries written.
    fn persist(&mut self, entries: &[LogEntry]) -> Result<usize, SinkError>;
}

impl<T: EntrySink + ?Sized> EntrySink for Box<T> {
    fn persist(&mut self, entries: &[LogEntry]) -> Result<usize, SinkError> {
        (**self).persist(entries)
    }
}

/// On-disk output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    JsonLines,
    /// CSV with a header row.
    Csv,
}

impl OutputFormat {
    pub fn label(&self) -> &'static str {
        match self {
            Self::JsonLines => "jsonl",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "json" => Ok(Self::JsonLines),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "unknown output format \"{other}\"; expected \"jsonl\" or \"csv\""
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Build the file sink for `format` writing to `path`.
pub fn open_file_sink(format: OutputFormat, path: PathBuf) -> Box<dyn EntrySink> {
    match format {
        OutputFormat::JsonLines => Box::new(JsonLinesSink::new(path)),
        OutputFormat::Csv => Box::new(CsvSink::new(path)),
    }
}

// =============================================================================
// JSON Lines
// =============================================================================

/// Appends each entry as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl EntrySink for JsonLinesSink {
    fn persist(&mut self, entries: &[LogEntry]) -> Result<usize, SinkError> {
        let buf = render_json_lines(entries, &self.path)?;
        append(&self.path, &buf)?;
        tracing::debug!(path = %self.path.display(), count = entries.len(), "Batch appended (jsonl)");
        Ok(entries.len())
    }
}

/// Render entries as JSON Lines into a buffer.
pub fn render_json_lines(entries: &[LogEntry], path: &Path) -> Result<Vec<u8>, SinkError> {
    let mut buf = Vec::new();
    for entry in entries {
        serde_json::to_writer(&mut buf, entry).map_err(|e| SinkError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        buf.push(b'\n');
    }
    Ok(buf)
}

// =============================================================================
// CSV
// =============================================================================

/// Appends entries as CSV rows; the header row is written only when the
/// output file is new or empty.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl EntrySink for CsvSink {
    fn persist(&mut self, entries: &[LogEntry]) -> Result<usize, SinkError> {
        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        let buf = render_csv(entries, needs_header, &self.path)?;
        append(&self.path, &buf)?;
        tracing::debug!(path = %self.path.display(), count = entries.len(), "Batch appended (csv)");
        Ok(entries.len())
    }
}

/// Render entries as CSV into a buffer, optionally preceded by the header.
pub fn render_csv(
    entries: &[LogEntry],
    with_header: bool,
    path: &Path,
) -> Result<Vec<u8>, SinkError> {
    let csv_err = |e: csv::Error| SinkError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let mut csv_writer = csv::Writer::from_writer(Vec::new());

    if with_header {
        csv_writer.write_record(LogEntry::COLUMNS).map_err(csv_err)?;
    }
    for entry in entries {
        csv_writer.write_record(entry.values()).map_err(csv_err)?;
    }

    csv_writer.into_inner().map_err(|e| SinkError::Io {
        path: path.to_path_buf(),
        source: e.into_error(),
    })
}

// =============================================================================
// In-memory
// =============================================================================

/// Keeps every batch in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Vec<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches received so far, in order.
    pub fn batches(&self) -> &[Vec<LogEntry>] {
        &self.batches
    }

    /// Total entries received across all batches.
    pub fn entry_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

impl EntrySink for MemorySink {
    fn persist(&mut self, entries: &[LogEntry]) -> Result<usize, SinkError> {
        self.batches.push(entries.to_vec());
        Ok(entries.len())
    }
}

/// Append `bytes` to `path` in a single write, creating the file (and its
/// parent directory) if needed.
fn append(path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
    let io_err = |e: std::io::Error| SinkError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.flush().map_err(io_err)?;
    file.sync_data().map_err(io_err)
}

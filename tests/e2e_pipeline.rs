// ErrHarvest - tests/e2e_pipeline.rs
//
// End-to-end tests for the harvest pipeline.
//
// These tests exercise the real filesystem: dated log files in a temp
// folder, the JSON position store on disk, and the JSON Lines / CSV output
// files. No mocks, apart from a sink that fails on demand to drive the
// retry path.

use errharvest::app::pipeline::{ActiveFile, Pipeline, PipelineConfig};
use errharvest::app::runner;
use errharvest::core::model::LogEntry;
use errharvest::store::position::{JsonFileStore, PositionStore};
use errharvest::store::sink::{open_file_sink, CsvSink, EntrySink, JsonLinesSink, OutputFormat};
use errharvest::util::error::{HarvestError, SinkError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DAY1: &str = "errors_2025-01-01.log";
const DAY2: &str = "errors_2025-01-02.log";

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Temp workspace: `logs/` is the watched folder, `data/` holds state and output.
struct Workspace {
    _dir: TempDir,
    logs: PathBuf,
    state: PathBuf,
    output: PathBuf,
}

impl Workspace {
    fn new(output_name: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        fs::create_dir(&logs).unwrap();
        let data = dir.path().join("data");
        Self {
            state: data.join("positions.json"),
            output: data.join(output_name),
            logs,
            _dir: dir,
        }
    }

    fn log(&self, name: &str) -> PathBuf {
        self.logs.join(name)
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            folder: self.logs.clone(),
            server_name: "EU".to_string(),
        }
    }

    fn jsonl_pipeline(&self) -> Pipeline<JsonFileStore, JsonLinesSink> {
        Pipeline::new(
            self.config(),
            JsonFileStore::open(&self.state).unwrap(),
            JsonLinesSink::new(self.output.clone()),
        )
    }

    fn output_entries(&self) -> Vec<LogEntry> {
        match fs::read_to_string(&self.output) {
            Ok(content) => content
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn stored_position(&self, name: &str) -> Option<(u64, bool)> {
        let store = JsonFileStore::open(&self.state).unwrap();
        store
            .get(name)
            .unwrap()
            .map(|s| (s.last_line_read, s.is_done))
    }
}

fn append(path: &Path, text: &str) {
    let mut f = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    f.write_all(text.as_bytes()).unwrap();
}

fn entry_text(time: &str, code: &str) -> String {
    format!("2025-01-01 {time} ERROR Guid {code}\nHTTP ERROR 500\nController: Home\n")
}

fn fixture_line_count() -> u64 {
    fs::read_to_string(fixture("errors_sample.log"))
        .unwrap()
        .lines()
        .count() as u64
}

/// Sink that rejects every batch while `fail` is set.
struct OutageSink {
    fail: bool,
    inner: JsonLinesSink,
}

impl EntrySink for OutageSink {
    fn persist(&mut self, entries: &[LogEntry]) -> Result<usize, SinkError> {
        if self.fail {
            return Err(SinkError::Rejected {
                reason: "downstream offline".to_string(),
            });
        }
        self.inner.persist(entries)
    }
}

// =============================================================================
// Parsing a realistic file
// =============================================================================

/// A realistic log file: leading fragment dropped, bad header dropped,
/// both valid entries fully parsed.
#[test]
fn e2e_harvests_fixture_file() {
    let ws = Workspace::new("entries.jsonl");
    fs::copy(fixture("errors_sample.log"), ws.log(DAY1)).unwrap();

    let mut pipeline = ws.jsonl_pipeline();
    let report = pipeline.run_cycle().unwrap();

    assert!(report.grown);
    assert_eq!(report.new_entries, 2);
    assert_eq!(report.last_line_read, fixture_line_count());

    let entries = ws.output_entries();
    assert_eq!(entries.len(), 2);

    let first = &entries[0];
    assert_eq!(first.server_date_time, "2025-01-01 00:41:25.7527");
    assert_eq!(first.error_code, "7f3c2a10-cc01-4d6e-9a1b-1d2f3e4a5b6c");
    assert_eq!(first.http_status_code, "500");
    assert_eq!(first.utc_date, "1/1/2025");
    assert_eq!(first.utc_time, "5:41:25 AM");
    assert_eq!(first.controller, "Orders");
    assert_eq!(first.action, "Details");
    assert_eq!(first.url, "https://shop.example.com/orders/details/42");
    assert_eq!(first.remote_host, "10.0.0.17");
    assert_eq!(first.user, "alice");
    assert_eq!(first.user_agent, "Mozilla/5.0 (Windows NT 10.0; Win64; x64)");
    assert_eq!(first.host, "shop.example.com");
    assert_eq!(first.referer, "https://shop.example.com/orders");
    assert_eq!(first.server, "EU");
    assert_eq!(first.stack_trace.lines().count(), 3);
    assert!(first
        .stack_trace
        .starts_with("Exception: System.NullReferenceException"));
    assert!(!first.stack_trace.contains("---"));

    let second = &entries[1];
    assert_eq!(second.error_code, "0b9d8e7f-1a2b-4c3d-8e9f-a0b1c2d3e4f5");
    assert_eq!(second.http_status_code, "404");
    assert_eq!(second.user, "bob", "later User: directive overwrites");
    assert_eq!(
        second.stack_trace,
        "Exception: RazorEngine.Templating.TemplateCompilationException: Errors while compiling a Template.\n\
         at RazorEngine.Templating.RazorEngineService.Compile()"
    );
    assert_eq!(second.host, "");

    assert_eq!(
        ws.stored_position(DAY1),
        Some((fixture_line_count(), false))
    );
}

// =============================================================================
// Restart and idempotence
// =============================================================================

/// A restarted process resumes from the stored position and delivers
/// nothing twice.
#[test]
fn e2e_restart_resumes_without_duplicates() {
    let ws = Workspace::new("entries.jsonl");
    append(&ws.log(DAY1), &entry_text("00:00:01.0000", "a"));

    {
        let mut pipeline = ws.jsonl_pipeline();
        pipeline.run_cycle().unwrap();
    }

    // Fresh process, nothing new.
    let mut pipeline = ws.jsonl_pipeline();
    assert_eq!(pipeline.active(), &ActiveFile::Unset);
    let report = pipeline.run_cycle().unwrap();
    assert!(!report.grown);
    assert_eq!(report.new_entries, 0);
    assert_eq!(ws.output_entries().len(), 1);

    // Growth after restart.
    append(&ws.log(DAY1), &entry_text("00:00:02.0000", "b"));
    let report = pipeline.run_cycle().unwrap();
    assert_eq!(report.new_entries, 1);

    let codes: Vec<String> = ws
        .output_entries()
        .into_iter()
        .map(|e| e.error_code)
        .collect();
    assert_eq!(codes, vec!["a", "b"]);
    assert_eq!(ws.stored_position(DAY1), Some((6, false)));
}

// =============================================================================
// Rollover
// =============================================================================

/// A newer dated file takes over; the old one is marked done with its
/// position intact, and both land in the CSV output.
#[test]
fn e2e_rollover_to_csv() {
    let ws = Workspace::new("entries.csv");
    append(&ws.log(DAY1), &entry_text("23:59:59.0000", "old"));

    let mut pipeline = Pipeline::new(
        ws.config(),
        JsonFileStore::open(&ws.state).unwrap(),
        CsvSink::new(ws.output.clone()),
    );
    pipeline.run_cycle().unwrap();

    append(&ws.log(DAY2), &entry_text("00:00:01.0000", "new"));
    let report = pipeline.run_cycle().unwrap();
    assert_eq!(report.retired.as_deref(), Some(DAY1));
    assert_eq!(report.filename, DAY2);

    assert_eq!(ws.stored_position(DAY1), Some((3, true)));
    assert_eq!(ws.stored_position(DAY2), Some((3, false)));

    let mut reader = csv::Reader::from_path(&ws.output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), LogEntry::COLUMNS.to_vec());
    let codes: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[6].to_string())
        .collect();
    assert_eq!(codes, vec!["old", "new"]);
}

// =============================================================================
// Failure handling
// =============================================================================

/// A sink outage leaves the on-disk position untouched; the same entries
/// are delivered once the sink recovers.
#[test]
fn e2e_sink_outage_retries_next_cycle() {
    let ws = Workspace::new("entries.jsonl");
    append(&ws.log(DAY1), &entry_text("00:00:01.0000", "a"));

    let mut pipeline = Pipeline::new(
        ws.config(),
        JsonFileStore::open(&ws.state).unwrap(),
        OutageSink {
            fail: true,
            inner: JsonLinesSink::new(ws.output.clone()),
        },
    );

    let err = runner::run_once(&mut pipeline).unwrap_err();
    assert!(matches!(err, HarvestError::Sink(SinkError::Rejected { .. })));
    assert_eq!(ws.stored_position(DAY1), Some((0, false)));
    assert!(ws.output_entries().is_empty());

    pipeline.sink_mut().fail = false;
    let report = runner::run_once(&mut pipeline).unwrap();
    assert_eq!(report.new_entries, 1);
    assert_eq!(ws.stored_position(DAY1), Some((3, false)));
    assert_eq!(ws.output_entries().len(), 1);
}

/// An empty watched folder fails the cycle without creating any state.
#[test]
fn e2e_no_log_file_is_a_cycle_error() {
    let ws = Workspace::new("entries.jsonl");
    fs::write(ws.logs.join("errors_latest.log"), "not dated\n").unwrap();

    let mut pipeline = ws.jsonl_pipeline();
    let err = pipeline.run_cycle().unwrap_err();
    assert!(matches!(err, HarvestError::Locate(_)));
    assert!(!ws.state.exists());
    assert!(!ws.output.exists());
}

/// The boxed sink chosen from the output format drives the pipeline the
/// same way the binary wires it.
#[test]
fn e2e_boxed_sink_from_format() {
    let ws = Workspace::new("entries.jsonl");
    fs::copy(fixture("errors_sample.log"), ws.log(DAY1)).unwrap();

    let mut pipeline = Pipeline::new(
        ws.config(),
        JsonFileStore::open(&ws.state).unwrap(),
        open_file_sink(OutputFormat::JsonLines, ws.output.clone()),
    );
    let report = runner::run_once(&mut pipeline).unwrap();
    assert_eq!(report.new_entries, 2);
    assert_eq!(ws.output_entries().len(), 2);
}

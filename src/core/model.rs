// ErrHarvest - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers. Serialised
// field names are the document schema seen by downstream consumers, so
// they are pinned with explicit renames rather than derived from the
// Rust field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Log Entry (output of parsing)
// =============================================================================

/// A single structured error record extracted from one entry block.
///
/// Every field is always present; anything the block did not mention stays
/// an empty string. `error_code` is never empty for a produced entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Local server date and time: `"<Date> <Time>"` from the header line.
    #[serde(rename = "ServerDateTime")]
    pub server_date_time: String,

    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Time")]
    pub time: String,

    #[serde(rename = "UTCDate")]
    pub utc_date: String,

    #[serde(rename = "UTCTime")]
    pub utc_time: String,

    #[serde(rename = "HTTPStatusCode")]
    pub http_status_code: String,

    /// Token following `ERROR Guid` on the header line.
    #[serde(rename = "ErrorCode")]
    pub error_code: String,

    #[serde(rename = "Controller")]
    pub controller: String,

    #[serde(rename = "Action")]
    pub action: String,

    #[serde(rename = "URL")]
    pub url: String,

    #[serde(rename = "RemoteHost")]
    pub remote_host: String,

    #[serde(rename = "User")]
    pub user: String,

    #[serde(rename = "UserAgent")]
    pub user_agent: String,

    /// Newline-joined trace lines, separators and blanks removed.
    #[serde(rename = "StackTrace")]
    pub stack_trace: String,

    #[serde(rename = "Host")]
    pub host: String,

    #[serde(rename = "Referer")]
    pub referer: String,

    /// Supplied by the caller, never parsed from the block.
    #[serde(rename = "Server")]
    pub server: String,
}

impl LogEntry {
    /// Column names in output order, matching the serialised field names.
    pub const COLUMNS: [&'static str; 17] = [
        "ServerDateTime",
        "Date",
        "Time",
        "UTCDate",
        "UTCTime",
        "HTTPStatusCode",
        "ErrorCode",
        "Controller",
        "Action",
        "URL",
        "RemoteHost",
        "User",
        "UserAgent",
        "StackTrace",
        "Host",
        "Referer",
        "Server",
    ];

    /// Field values in `COLUMNS` order.
    pub fn values(&self) -> [&str; 17] {
        [
            self.server_date_time.as_str(),
            self.date.as_str(),
            self.time.as_str(),
            self.utc_date.as_str(),
            self.utc_time.as_str(),
            self.http_status_code.as_str(),
            self.error_code.as_str(),
            self.controller.as_str(),
            self.action.as_str(),
            self.url.as_str(),
            self.remote_host.as_str(),
            self.user.as_str(),
            self.user_agent.as_str(),
            self.stack_trace.as_str(),
            self.host.as_str(),
            self.referer.as_str(),
            self.server.as_str(),
        ]
    }
}

// =============================================================================
// File State (position record)
// =============================================================================

/// Persisted resume position for one dated log file.
///
/// Created with `last_line_read = 0` on first observation. The position only
/// moves forward while the file is active, and `is_done` flips to true once
/// when a newer dated file takes over. Records are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    #[serde(rename = "Filename")]
    pub filename: String,

    #[serde(rename = "Filepath")]
    pub filepath: PathBuf,

    /// Number of lines already folded into a previous cycle's output.
    #[serde(rename = "LastLineRead")]
    pub last_line_read: u64,

    #[serde(rename = "IsDone")]
    pub is_done: bool,

    /// When the store last wrote this record.
    #[serde(rename = "UpdatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl FileState {
    /// A fresh record for a file seen for the first time.
    pub fn new(filename: impl Into<String>, filepath: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            filepath: filepath.into(),
            last_line_read: 0,
            is_done: false,
            updated_at: None,
        }
    }
}

// =============================================================================
// Located File (output of the locator)
// =============================================================================

/// The newest dated error log found in the watched folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFile {
    /// Bare filename, e.g. `errors_2025-01-01.log`. Key of the position record.
    pub name: String,

    /// Full path to the file.
    pub path: PathBuf,
}

// =============================================================================
// Cycle Report
// =============================================================================

/// Outcome of one successful harvest cycle, logged by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Active file name after any rollover.
    pub filename: String,

    /// Active file path.
    pub path: PathBuf,

    /// Whether the file had more lines than the stored position.
    pub grown: bool,

    /// Stored position after the cycle.
    pub last_line_read: u64,

    /// Entries handed to the sink this cycle.
    pub new_entries: usize,

    /// Name of the file retired by a rollover during this cycle.
    pub retired: Option<String>,
}

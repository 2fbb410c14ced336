// ErrHarvest - core/parser.rs
//
// Converts one raw entry block into a structured `LogEntry`.
// Core layer: pure function over a string, never touches the filesystem.
//
// Block layout:
//   line 1   header     `<date> <time> ERROR Guid <code> ...` (mandatory)
//   line 2   status     `HTTP ERROR <code>` (optional, positional)
//   line 3+  body       directives, an optional exception section, and an
//                       optional request-headers section
//
// The header is the only thing that can reject a block. Every other field
// is best-effort and degrades to an empty string.

use crate::core::model::LogEntry;
use crate::util::constants::{HEADERS_MARKER, TEMPLATE_MARKER};

/// Which section of the body the scan is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Directive lines (`Controller:`, `User:`, ...).
    Normal,
    /// Inside an `Exception:` section; every line is trace text.
    StackTrace,
    /// After the `Headers` marker; only `Host:` and `Referer:` matter.
    Headers,
}

/// Parse a single entry block.
///
/// Returns `None` when the first line is not an `ERROR Guid` header (or the
/// block is empty). Never panics, whatever the input.
pub fn parse_entry(block: &str, server_name: &str) -> Option<LogEntry> {
    let mut lines = block.lines();

    let mut entry = LogEntry {
        server: server_name.to_string(),
        ..Default::default()
    };

    // --- Line 1: header -----------------------------------------------------
    let header: Vec<&str> = lines.next()?.split_whitespace().collect();
    if header.len() < 5 || header[2] != "ERROR" || header[3] != "Guid" {
        return None;
    }
    entry.date = header[0].to_string();
    entry.time = header[1].to_string();
    entry.server_date_time = format!("{} {}", header[0], header[1]);
    entry.error_code = header[4].to_string();

    // --- Line 2: HTTP status (consumed positionally either way) ------------
    if let Some(line) = lines.next() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if let ["HTTP", "ERROR", code] = parts.as_slice() {
            entry.http_status_code = (*code).to_string();
        }
    }

    // --- Body ---------------------------------------------------------------
    let mut section = Section::Normal;
    let mut trace: Vec<&str> = Vec::new();

    for raw in lines {
        let line = raw.trim();

        match section {
            Section::StackTrace => {
                if line == HEADERS_MARKER {
                    section = Section::Headers;
                } else if line.starts_with(TEMPLATE_MARKER) {
                    section = Section::Normal;
                } else {
                    trace.push(line);
                }
            }
            Section::Headers => {
                if line.starts_with("Host:") {
                    entry.host = after_colon(line).to_string();
                } else if line.starts_with("Referer:") {
                    entry.referer = after_colon(line).to_string();
                }
            }
            Section::Normal => {
                if line.starts_with("Exception:") {
                    section = Section::StackTrace;
                    // A new exception section restarts the trace.
                    trace.clear();
                    trace.push(line);
                } else if line.starts_with("UTC Date:") && entry.utc_date.is_empty() {
                    apply_utc_date(&mut entry, after_colon(line));
                } else if line.starts_with("Controller:") {
                    set_once(&mut entry.controller, line);
                } else if line.starts_with("Action:") {
                    set_once(&mut entry.action, line);
                } else if line.starts_with("URL:") {
                    set_once(&mut entry.url, line);
                } else if line.starts_with("Remote host:") {
                    set_once(&mut entry.remote_host, line);
                } else if line.starts_with("User:") {
                    // Last occurrence wins, unlike the other directives.
                    entry.user = after_colon(line).to_string();
                } else if line.starts_with("User agent:") {
                    set_once(&mut entry.user_agent, line);
                }
            }
        }
    }

    entry.stack_trace = trace
        .into_iter()
        .filter(|l| !l.is_empty() && !is_separator(l))
        .collect::<Vec<_>>()
        .join("\n");

    Some(entry)
}

/// Text after the first colon, trimmed. Empty when there is no colon.
fn after_colon(line: &str) -> &str {
    line.split_once(':').map(|(_, v)| v.trim()).unwrap_or("")
}

/// Assign a directive's value only while the field is still empty.
fn set_once(field: &mut String, line: &str) {
    if field.is_empty() {
        *field = after_colon(line).to_string();
    }
}

/// A trace line made only of hyphens (`---------------`).
fn is_separator(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b == b'-')
}

/// Split the `UTC Date:` value into date and time.
///
/// The value is split into at most three whitespace-separated pieces: the
/// first is the date, the rest (time plus an optional AM/PM or trailing
/// text) is the time. If the value does not fit that shape, the raw text is
/// kept as the date so nothing is lost.
fn apply_utc_date(entry: &mut LogEntry, value: &str) {
    match split_date_time(value) {
        Some((date, time)) => {
            entry.utc_date = date.to_string();
            entry.utc_time = time;
        }
        None => {
            tracing::debug!(
                value_len = value.len(),
                "UTC Date value has no date token; storing raw"
            );
            entry.utc_date = value.to_string();
        }
    }
}

fn split_date_time(value: &str) -> Option<(&str, String)> {
    let mut parts = value.trim().splitn(2, char::is_whitespace);
    let date = parts.next().filter(|d| !d.is_empty())?;
    let rest = parts.next().map(str::trim_start).unwrap_or("");

    // At most two more pieces: the second keeps its internal spacing.
    let mut rest_parts = rest.splitn(2, char::is_whitespace);
    let time = match (rest_parts.next(), rest_parts.next()) {
        (Some(t), Some(tail)) if !t.is_empty() && !tail.trim().is_empty() => {
            format!("{} {}", t, tail.trim_start())
        }
        (Some(t), _) => t.to_string(),
        (None, _) => String::new(),
    };

    Some((date, time))
}

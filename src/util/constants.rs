// ErrHarvest - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ErrHarvest";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ErrHarvest";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Log file naming and entry shape
// =============================================================================

/// Filename pattern of the daily error log. The date encoding sorts
/// lexicographically in chronological order, so the greatest name is newest.
pub const ERROR_LOG_FILE_PATTERN: &str = r"^errors_\d{4}-\d{2}-\d{2}\.log$";

/// Line-anchored pattern marking the first line of an entry block.
pub const ENTRY_HEADER_PATTERN: &str = r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d+ ERROR Guid";

/// Section marker that ends a stack trace and opens the request headers.
pub const HEADERS_MARKER: &str = "Headers";

/// Prefix of the line that ends a stack trace and returns to normal parsing.
pub const TEMPLATE_MARKER: &str = "The template we tried to compile is";

/// Server name stamped on entries when none is configured.
pub const DEFAULT_SERVER_NAME: &str = "US";

// =============================================================================
// Scheduling
// =============================================================================

/// Default interval between harvest cycles (seconds).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Minimum user-configurable poll interval (seconds).
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Maximum user-configurable poll interval (seconds).
pub const MAX_POLL_INTERVAL_SECS: u64 = 3_600;

/// How often the cancel flag is checked within each poll sleep interval (ms).
pub const CANCEL_CHECK_INTERVAL_MS: u64 = 100;

// =============================================================================
// Tailing
// =============================================================================

/// File size in bytes above which the whole-file re-read logs a warning.
/// Each cycle reads the active file in full, so cost grows with the file.
pub const LARGE_FILE_WARN_BYTES: u64 = 256 * 1024 * 1024; // 256 MB

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Accepted values for `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// =============================================================================
// Persistence
// =============================================================================

/// Position store file name (stored in the platform data directory).
pub const STATE_FILE_NAME: &str = "positions.json";

/// Default harvested-entry output file name (platform data directory).
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "entries.jsonl";

/// Schema version of the position store document.
pub const STATE_VERSION: u32 = 1;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable naming the watched folder.
pub const FOLDER_ENV_VAR: &str = "ERRHARVEST_FOLDER";

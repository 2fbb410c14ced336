// ErrHarvest - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.
//
// Note what is NOT here: a block whose header does not match is not an
// error, it is simply dropped by the parser. Field-level anomalies degrade
// to empty values and never surface as errors either.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ErrHarvest operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum HarvestError {
    /// Locating the active error log failed.
    Locate(LocateError),

    /// Reading the active error log failed.
    Tail(TailError),

    /// Reading or writing the position store failed.
    Store(StoreError),

    /// Handing a batch to the entry sink failed.
    Sink(SinkError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for HarvestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locate(e) => write!(f, "Locate error: {e}"),
            Self::Tail(e) => write!(f, "Tail error: {e}"),
            Self::Store(e) => write!(f, "Position store error: {e}"),
            Self::Sink(e) => write!(f, "Entry sink error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for HarvestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Locate(e) => Some(e),
            Self::Tail(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Sink(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Locate errors
// ---------------------------------------------------------------------------

/// Errors raised while looking for the newest dated error log.
#[derive(Debug)]
pub enum LocateError {
    /// The watched folder does not exist.
    DirectoryNotFound { path: PathBuf },

    /// The watched path exists but is not a directory.
    NotADirectory { path: PathBuf },

    /// The folder exists but holds no file named `errors_YYYY-MM-DD.log`.
    NoCandidate { path: PathBuf },

    /// Listing the folder failed part-way.
    Io {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryNotFound { path } => {
                write!(f, "Folder '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "'{}' is not a directory", path.display())
            }
            Self::NoCandidate { path } => write!(
                f,
                "No file matching errors_YYYY-MM-DD.log in '{}'",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "Error listing '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LocateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LocateError> for HarvestError {
    fn from(e: LocateError) -> Self {
        Self::Locate(e)
    }
}

// ---------------------------------------------------------------------------
// Tail errors
// ---------------------------------------------------------------------------

/// Errors raised while reading the active log file.
#[derive(Debug)]
pub enum TailError {
    /// The file disappeared between locate and read.
    NotFound { path: PathBuf },

    /// Any other read failure (permissions, sharing violation, ...).
    Read { path: PathBuf, source: io::Error },
}

impl TailError {
    /// Classify an I/O failure on `path`.
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Read { path, source }
        }
    }
}

impl fmt::Display for TailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "'{}' was not found", path.display()),
            Self::Read { path, source } => {
                write!(f, "Cannot read '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for TailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<TailError> for HarvestError {
    fn from(e: TailError) -> Self {
        Self::Tail(e)
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors related to the position store.
#[derive(Debug)]
pub enum StoreError {
    /// The store document could not be parsed.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The store document was written by an incompatible version.
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    /// I/O error reading or writing the store.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { path, source } => {
                write!(f, "Malformed position store '{}': {source}", path.display())
            }
            Self::VersionMismatch {
                path,
                found,
                expected,
            } => write!(
                f,
                "Position store '{}' has version {found}, expected {expected}",
                path.display()
            ),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "Position store I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<StoreError> for HarvestError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

/// Errors related to persisting a batch of entries.
#[derive(Debug)]
pub enum SinkError {
    /// I/O error writing the output file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The downstream collection rejected the batch.
    Rejected { reason: String },
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Output I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV output error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON output error '{}': {source}", path.display())
            }
            Self::Rejected { reason } => write!(f, "Batch rejected: {reason}"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Rejected { .. } => None,
        }
    }
}

impl From<SinkError> for HarvestError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// No watched folder was given on the CLI, env, or config file.
    MissingFolder,

    /// The watched folder is not an existing directory.
    InvalidFolder { path: PathBuf },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::MissingFolder => write!(
                f,
                "No folder to watch. Pass it as an argument, set {}, \
                 or add [watch] folder to {}",
                super::constants::FOLDER_ENV_VAR,
                super::constants::CONFIG_FILE_NAME
            ),
            Self::InvalidFolder { path } => {
                write!(f, "Invalid folder path: '{}'", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for HarvestError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for ErrHarvest results.
pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_tail_error_classifies_not_found() {
        let err = TailError::from_io(
            PathBuf::from("gone.log"),
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, TailError::NotFound { .. }));
    }

    #[test]
    fn test_tail_error_keeps_other_io_kinds() {
        let err = TailError::from_io(
            PathBuf::from("locked.log"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, TailError::Read { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_harvest_error_preserves_chain() {
        let err: HarvestError = LocateError::NoCandidate {
            path: PathBuf::from("/logs"),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Locate error:"), "got {msg}");
        assert!(err.source().is_some());
    }
}

// ErrHarvest - platform/config.rs
//
// Platform data directory resolution and config.toml loading with startup
// validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.
//
// Precedence for every setting: CLI flag / env var > config.toml > default.
// CLI overrides are applied by the binary after `load_config` returns.

use crate::store::sink::OutputFormat;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths for ErrHarvest data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/errharvest/ or %APPDATA%\ErrHarvest\config\)
    pub config_dir: PathBuf,

    /// Data directory holding the position store and default output file.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
                data_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[watch]` section.
    pub watch: WatchSection,
    /// `[store]` section.
    pub store: StoreSection,
    /// `[output]` section.
    pub output: OutputSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[watch]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Folder holding the dated error logs.
    pub folder: Option<String>,
    /// Value stamped into every entry's `Server` field.
    pub server_name: Option<String>,
    /// Seconds between harvest cycles.
    pub poll_interval_secs: Option<u64>,
}

/// `[store]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Position store path.
    pub state_file: Option<String>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Output file path.
    pub path: Option<String>,
    /// "jsonl" or "csv".
    pub format: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated application configuration.
///
/// Values are checked against named constants at load time. Invalid values
/// produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Watch --
    /// Folder to watch. `None` until supplied by CLI, env, or config file.
    pub folder: Option<PathBuf>,
    pub server_name: String,
    pub poll_interval: Duration,

    // -- Persistence --
    pub state_file: PathBuf,
    pub output_path: PathBuf,
    pub output_format: OutputFormat,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Defaults rooted in the platform data directory.
    pub fn with_defaults(paths: &PlatformPaths) -> Self {
        Self {
            folder: None,
            server_name: constants::DEFAULT_SERVER_NAME.to_string(),
            poll_interval: Duration::from_secs(constants::DEFAULT_POLL_INTERVAL_SECS),
            state_file: paths.data_dir.join(constants::STATE_FILE_NAME),
            output_path: paths.data_dir.join(constants::DEFAULT_OUTPUT_FILE_NAME),
            output_format: OutputFormat::default(),
            log_level: None,
            log_file: None,
        }
    }

    /// The watched folder, checked to be an existing directory.
    pub fn validated_folder(&self) -> Result<&Path, ConfigError> {
        let folder = self.folder.as_deref().ok_or(ConfigError::MissingFolder)?;
        validate_folder(folder)?;
        Ok(folder)
    }
}

/// Check that `path` exists and is a directory.
pub fn validate_folder(path: &Path) -> Result<(), ConfigError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        _ => Err(ConfigError::InvalidFolder {
            path: path.to_path_buf(),
        }),
    }
}

/// Check a poll interval (seconds) against the allowed range.
pub fn validate_poll_interval(secs: u64) -> Result<Duration, String> {
    if (constants::MIN_POLL_INTERVAL_SECS..=constants::MAX_POLL_INTERVAL_SECS).contains(&secs) {
        Ok(Duration::from_secs(secs))
    } else {
        Err(format!(
            "poll interval {secs}s is out of range ({}-{})",
            constants::MIN_POLL_INTERVAL_SECS,
            constants::MAX_POLL_INTERVAL_SECS,
        ))
    }
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unreadable or unparseable, returns defaults with a warning;
/// the harvester still starts but the user is informed.
pub fn load_config(config_path: &Path, paths: &PlatformPaths) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::with_defaults(paths), warnings);
    }

    let raw = match read_raw(config_path) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!(
                "{e}. Using defaults. See config.example.toml for the expected format."
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::with_defaults(paths), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let config = apply_raw(raw, paths, &mut warnings);

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

fn read_raw(config_path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
        path: config_path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source,
    })
}

/// Validate each raw field against named constants, accumulating warnings.
fn apply_raw(raw: RawConfig, paths: &PlatformPaths, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::with_defaults(paths);

    // -- Watch: folder --
    if let Some(folder) = raw.watch.folder.filter(|f| !f.trim().is_empty()) {
        config.folder = Some(PathBuf::from(folder));
    }

    // -- Watch: server_name --
    if let Some(name) = raw.watch.server_name {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            warnings.push(format!(
                "[watch] server_name is empty. Using default ({}).",
                constants::DEFAULT_SERVER_NAME,
            ));
        } else {
            config.server_name = trimmed.to_string();
        }
    }

    // -- Watch: poll_interval_secs --
    if let Some(secs) = raw.watch.poll_interval_secs {
        match validate_poll_interval(secs) {
            Ok(interval) => config.poll_interval = interval,
            Err(e) => warnings.push(format!(
                "[watch] poll_interval_secs: {e}. Using default ({}).",
                constants::DEFAULT_POLL_INTERVAL_SECS,
            )),
        }
    }

    // -- Store: state_file --
    if let Some(file) = raw.store.state_file.filter(|f| !f.is_empty()) {
        config.state_file = PathBuf::from(file);
    }

    // -- Output: path --
    if let Some(path) = raw.output.path.filter(|p| !p.is_empty()) {
        config.output_path = PathBuf::from(path);
    }

    // -- Output: format --
    if let Some(ref format) = raw.output.format {
        match format.parse::<OutputFormat>() {
            Ok(f) => config.output_format = f,
            Err(e) => warnings.push(format!(
                "[output] format: {e}. Using default ({}).",
                OutputFormat::default(),
            )),
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: {}. Using default ({}).",
                constants::VALID_LOG_LEVELS.join(", "),
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    // -- Logging: file --
    if let Some(file) = raw.logging.file.filter(|f| !f.is_empty()) {
        config.log_file = Some(PathBuf::from(file));
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(dir: &TempDir) -> PlatformPaths {
        PlatformPaths {
            config_dir: dir.path().join("config"),
            data_dir: dir.path().join("data"),
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join(constants::CONFIG_FILE_NAME);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let p = paths(&dir);
        let (config, warnings) = load_config(&dir.path().join("nope.toml"), &p);

        assert!(warnings.is_empty());
        assert!(config.folder.is_none());
        assert_eq!(config.server_name, "US");
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.state_file, p.data_dir.join("positions.json"));
        assert_eq!(config.output_path, p.data_dir.join("entries.jsonl"));
        assert_eq!(config.output_format, OutputFormat::JsonLines);
    }

    #[test]
    fn test_full_config_is_applied() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[watch]
folder = "/var/log/app"
server_name = "EU"
poll_interval_secs = 60

[store]
state_file = "/tmp/pos.json"

[output]
path = "/tmp/out.csv"
format = "csv"

[logging]
level = "DEBUG"
file = "/tmp/harvest.log"
"#,
        );
        let (config, warnings) = load_config(&path, &paths(&dir));

        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.folder, Some(PathBuf::from("/var/log/app")));
        assert_eq!(config.server_name, "EU");
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.state_file, PathBuf::from("/tmp/pos.json"));
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.csv"));
        assert_eq!(config.output_format, OutputFormat::Csv);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/harvest.log")));
    }

    #[test]
    fn test_invalid_values_warn_and_fall_back() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[watch]
server_name = "   "
poll_interval_secs = 0

[output]
format = "xml"

[logging]
level = "loud"
"#,
        );
        let (config, warnings) = load_config(&path, &paths(&dir));

        assert_eq!(warnings.len(), 4, "{warnings:?}");
        assert_eq!(config.server_name, "US");
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.output_format, OutputFormat::JsonLines);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_unparseable_file_warns_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "this is [not toml");
        let (config, warnings) = load_config(&path, &paths(&dir));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Config parse error"));
        assert!(config.folder.is_none());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[watch]\nfolder = \"/x\"\nfuture_key = 1\n\n[extra]\na = 2\n");
        let (config, warnings) = load_config(&path, &paths(&dir));
        assert!(warnings.is_empty());
        assert_eq!(config.folder, Some(PathBuf::from("/x")));
    }

    #[test]
    fn test_validated_folder() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::with_defaults(&paths(&dir));
        assert!(matches!(
            config.validated_folder(),
            Err(ConfigError::MissingFolder)
        ));

        config.folder = Some(dir.path().join("missing"));
        assert!(matches!(
            config.validated_folder(),
            Err(ConfigError::InvalidFolder { .. })
        ));

        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        config.folder = Some(file);
        assert!(config.validated_folder().is_err());

        config.folder = Some(dir.path().to_path_buf());
        assert_eq!(config.validated_folder().unwrap(), dir.path());
    }

    #[test]
    fn test_poll_interval_bounds() {
        assert!(validate_poll_interval(0).is_err());
        assert!(validate_poll_interval(1).is_ok());
        assert!(validate_poll_interval(3_600).is_ok());
        assert!(validate_poll_interval(3_601).is_err());
    }
}

// ErrHarvest - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and CLI overrides
// 3. Logging initialisation (debug mode support)
// 4. Startup validation of the watched folder
// 5. Opening the position store and entry sink
// 6. Running the poll loop (or a single cycle with --once)

use clap::Parser;
use errharvest::app::pipeline::{Pipeline, PipelineConfig};
use errharvest::app::runner;
use errharvest::platform::config::{self, AppConfig, PlatformPaths};
use errharvest::store::position::JsonFileStore;
use errharvest::store::sink::{self, OutputFormat};
use errharvest::util;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// ErrHarvest - Incremental harvester for daily error logs.
///
/// Watches a folder of `errors_YYYY-MM-DD.log` files, parses new entries from
/// the newest one on a fixed interval, and appends them to an output file.
#[derive(Parser, Debug)]
#[command(name = "errharvest", version, about)]
struct Cli {
    /// Folder holding the dated error logs.
    #[arg(env = "ERRHARVEST_FOLDER")]
    folder: Option<PathBuf>,

    /// Path to config.toml (default: platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Server name stamped on every entry.
    #[arg(short = 's', long = "server")]
    server: Option<String>,

    /// Seconds between harvest cycles.
    #[arg(short = 'i', long = "interval")]
    interval: Option<u64>,

    /// Position store path.
    #[arg(long = "state-file")]
    state_file: Option<PathBuf>,

    /// Output file path.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output format: jsonl or csv.
    #[arg(short = 'f', long = "format")]
    format: Option<OutputFormat>,

    /// Run a single cycle and exit.
    #[arg(long = "once")]
    once: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    let platform_paths = PlatformPaths::resolve();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| platform_paths.config_file());

    // Config is read before logging so its level and file can be honoured;
    // its warnings are replayed once the subscriber is up.
    let (mut app_config, warnings) = config::load_config(&config_path, &platform_paths);
    let interval_warning = apply_cli_overrides(&mut app_config, &cli);

    util::logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        app_config.log_file.as_deref(),
    );

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "ErrHarvest starting"
    );
    for w in warnings.iter().chain(interval_warning.iter()) {
        tracing::warn!(warning = %w, "Configuration warning");
    }

    let folder = match app_config.validated_folder() {
        Ok(folder) => folder.to_path_buf(),
        Err(e) => fail("Invalid watched folder", &e),
    };

    let store = match JsonFileStore::open(&app_config.state_file) {
        Ok(store) => store,
        Err(e) => fail("Cannot open position store", &e),
    };

    let entry_sink = sink::open_file_sink(app_config.output_format, app_config.output_path.clone());

    tracing::info!(
        folder = %folder.display(),
        server = %app_config.server_name,
        interval_secs = app_config.poll_interval.as_secs(),
        state_file = %app_config.state_file.display(),
        output = %app_config.output_path.display(),
        format = %app_config.output_format,
        "Configuration resolved"
    );

    let mut pipeline = Pipeline::new(
        PipelineConfig {
            folder,
            server_name: app_config.server_name.clone(),
        },
        store,
        entry_sink,
    );

    if cli.once {
        match runner::run_once(&mut pipeline) {
            Ok(_) => return,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!(error = %e, "Cannot install Ctrl-C handler; stop the process to exit");
    }

    runner::run_loop(&mut pipeline, app_config.poll_interval, &cancel);
}

/// Layer CLI flags over the loaded config. Returns a warning if the
/// requested interval was out of range.
fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) -> Option<String> {
    if let Some(ref folder) = cli.folder {
        config.folder = Some(folder.clone());
    }
    if let Some(ref server) = cli.server {
        config.server_name = server.clone();
    }
    if let Some(ref path) = cli.state_file {
        config.state_file = path.clone();
    }
    if let Some(ref path) = cli.output {
        config.output_path = path.clone();
    }
    if let Some(format) = cli.format {
        config.output_format = format;
    }

    let secs = cli.interval?;
    match config::validate_poll_interval(secs) {
        Ok(interval) => {
            config.poll_interval = interval;
            None
        }
        Err(e) => Some(format!(
            "--interval: {e}. Using {}s.",
            config.poll_interval.as_secs()
        )),
    }
}

fn fail(context: &str, err: &dyn std::error::Error) -> ! {
    tracing::error!(error = %err, "{context}");
    eprintln!("Error: {context}: {err}");
    std::process::exit(1);
}

//! Structured logging for the quarry importer.
//!
//! Console output goes to stderr so it never mixes with the report printed
//! on stdout. A JSON file layer can be switched on from the configuration
//! for post-mortem analysis of a failed import.

use std::fs::File;
use std::path::{Path, PathBuf};

use quarry_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "info";

/// File name of the JSON log inside the log directory.
pub const LOG_FILE_NAME: &str = "quarry.log";

/// Initialize the global tracing subscriber.
///
/// Sets up:
/// - Console output on stderr with uptime, target and level
/// - Environment-based filtering (`RUST_LOG` wins over the config level)
/// - JSON logging to `log_dir/quarry.log` when `config.log.json_file` is set
///
/// Returns the JSON log path if the file layer was installed. Failing to
/// create the directory or file silently falls back to console only.
///
/// # Examples
///
/// ```no_run
/// use quarry_config::Config;
/// use quarry_log::init_logging;
///
/// let mut config = Config::default();
/// config.log.json_file = true;
/// let json = init_logging(Some(std::path::Path::new("./logs")), Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, config: Option<&Config>) -> Option<PathBuf> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if config.is_some_and(|c| c.log.json_file)
        && let Some(log_dir) = log_dir
        && let Some((log_file, log_path)) = open_json_log(log_dir)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return Some(log_path);
    }

    subscriber.init();
    None
}

/// Creates `log_dir` and truncates the JSON log inside it.
fn open_json_log(log_dir: &Path) -> Option<(File, PathBuf)> {
    std::fs::create_dir_all(log_dir).ok()?;
    let path = log_dir.join(LOG_FILE_NAME);
    let file = File::create(&path).ok()?;
    Some((file, path))
}

/// The filter directive the config asks for, or [`DEFAULT_FILTER`].
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.log.level.trim().is_empty() => config.log.level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

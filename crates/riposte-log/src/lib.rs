//! Structured logging for the Riposte combat core.
//!
//! Installs a `tracing` subscriber with console output (uptime timestamps and
//! module paths) and optional JSON file output for post-run analysis of
//! replication traces. The log level comes from `RUST_LOG` when set, otherwise
//! from the configuration's `debug.log_level`.

use std::path::Path;

use riposte_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when neither `RUST_LOG` nor a config level is available.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written inside `log_dir`.
pub const LOG_FILE_NAME: &str = "riposte.log";

/// Resolve the filter string from an optional config.
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file, used only when the config
///   enables `debug.log_to_file`
/// * `config` - optional configuration supplying the log level
///
/// Calling this twice panics inside `tracing-subscriber`; binaries call it
/// once from `main`.
pub fn init_logging(log_dir: Option<&Path>, config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    let to_file = config.is_some_and(|c| c.debug.log_to_file);
    if to_file
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

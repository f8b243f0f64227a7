use crate::config::LoggingConfig;
use crate::constants::DEFAULT_LOG_FILE;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console logging (human-readable, or JSON with `[logging] json`)
/// and, when a log directory is configured, a daily-rotated JSON file log.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// life of the process.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("urlshare=info,tower_http=info"));

    let (text_console, json_console) = if config.json {
        (None, Some(fmt::layer().json().with_writer(std::io::stdout)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stdout)), None)
    };

    let (file_layer, guard) = match &config.dir {
        Some(dir) => {
            let _ = fs::create_dir_all(dir);
            let file_appender = tracing_appender::rolling::daily(dir, DEFAULT_LOG_FILE);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            (
                Some(fmt::layer().json().with_writer(non_blocking_writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(text_console)
        .with(json_console)
        .init();

    guard
}

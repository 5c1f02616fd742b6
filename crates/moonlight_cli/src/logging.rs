//! Subscriber setup for the CLI.
//!
//! Two layers: a console layer on stderr filtered by `RUST_LOG` (or the
//! `--verbose` default), and a daily-rolling plain-text file at
//! `<root>/logs/moonlight.log` that records everything at debug and above.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// File name prefix of the rolling log.
pub const LOG_FILE: &str = "moonlight.log";

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the life of the process. Returns `None` if a subscriber is already set.
pub fn init(logs_dir: &Path, verbose: bool) -> Option<WorkerGuard> {
    let default = if verbose { "debug" } else { "info" };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let console_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file_layer, guard) = match std::fs::create_dir_all(logs_dir) {
        Ok(()) => {
            let (writer, guard) = tracing_appender::non_blocking(rolling::daily(logs_dir, LOG_FILE));
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .ok()?;

    tracing::debug!(logs = %logs_dir.display(), "logging initialized");
    guard
}

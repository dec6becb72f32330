//! Logging and tracing configuration
//!
//! Logs are controlled by the `RUST_LOG` environment variable. Default level
//! is INFO for this crate (DEBUG with `--verbose`), WARN for dependencies.
//! A run can additionally be mirrored to a plain-text log file.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("stepwright=debug,warn")
        } else {
            EnvFilter::new("stepwright=info,warn")
        }
    })
}

/// Initialize tracing for the CLI (stderr logging)
///
/// When `log_file` is given, events are also written there without ANSI
/// colors. The returned guard must be kept alive until exit so buffered
/// lines are flushed.
pub fn init_cli(verbose: bool, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let Some(log_file) = log_file else {
        tracing_subscriber::registry()
            .with(default_filter(verbose))
            .with(stderr_layer)
            .init();
        return None;
    };

    if let Err(e) = paths::ensure_parent_dir(log_file) {
        eprintln!("Warning: Could not create log directory: {}", e);
    }

    let dir = log_file
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "stepwright.log".into());

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Some(guard)
}

/// Default log file used by `--log`
pub fn default_log_path() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join("run.log"))
}

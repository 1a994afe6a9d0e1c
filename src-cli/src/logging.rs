//! Logging initialization.
//!
//! Human-facing diagnostics go to stderr at `warn` (or `info` with
//! `--verbose`); a daily rolling file in the platform log directory keeps
//! `debug` detail from the attendo crates for troubleshooting.

use attendo_common::logging::{ensure_log_dir, LOG_FILE_PREFIX};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const FILE_FILTER: &str = "info,attendo_client=debug,attendo_cli=debug";

/// Stderr filter: `RUST_LOG` when set, otherwise derived from the flags.
fn console_filter(verbose: bool, quiet: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match (verbose, quiet) {
            (_, true) => "error",
            (true, false) => "info",
            (false, false) => "warn",
        })
    })
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init(verbose: bool, quiet: bool) -> Option<WorkerGuard> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter(verbose, quiet));

    let (file, guard) = match ensure_log_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(FILE_FILTER));
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    // No-op when a global subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_filter_levels() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(console_filter(false, false).to_string(), "warn");
        assert_eq!(console_filter(true, false).to_string(), "info");
        assert_eq!(console_filter(true, true).to_string(), "error");
    }
}

//! Structured logging setup for the `fg` binary.
//!
//! - stdout is reserved for command payloads (JSON results)
//! - stderr receives all log output, human-readable or JSON lines
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! caller's choice.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// `config.level` already folds in `FG_LOG`, `RUST_LOG` and the CLI flags.
fn filter_for(config: &LogConfig) -> EnvFilter {
    EnvFilter::new(format!("fg_core={}", config.level))
}

/// Install the global subscriber.
///
/// Returns false if a subscriber was already installed; the earlier one
/// stays in effect.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = filter_for(config);
    let installed = match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                tracing_subscriber::registry().with(filter).with(layer).try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
    };
    installed.is_ok()
}

/// Initialize logging from the environment alone.
pub fn init_default_logging() -> bool {
    init_logging(&LogConfig::from_env(None, None))
}

//! Structured logging setup
//!
//! Library code only emits `tracing` events; the binary installs the
//! subscriber once at startup. Output goes to stderr because stdout carries
//! the JSON responses of the CLI.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human-readable single line
    #[default]
    Compact,
}

/// Install the global subscriber.
///
/// `level` is an `EnvFilter` directive (`"info"`, `"policy_resolver=debug"`);
/// an unparseable directive falls back to `info`. `RUST_LOG` wins when set.
/// Calling this twice is harmless: the second install is ignored.
pub fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
}

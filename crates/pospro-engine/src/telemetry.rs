//! # Telemetry
//!
//! Structured logging for the engine and everything below it.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - every repository write with ids and cents
//! - `RUST_LOG=pospro_engine=info,sqlx=warn` - one line per committed operation
//! - Default: the `[logging] filter` from [`EngineConfig`](crate::EngineConfig)

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins over the configured filter. Safe to call more than once:
/// later calls leave the first subscriber in place and return `false`.
pub fn init(settings: &LoggingSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .is_ok()
}

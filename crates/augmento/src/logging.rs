//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging with support for
//! both human-readable and JSON output formats.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem at `level`.
///
/// Log output goes to stderr (stdout is reserved for the dry-run plan).
/// The RUST_LOG environment variable overrides the level.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the run config and CLI overrides.
pub fn init_from_config(config: &augmento_core::Config, verbose_override: bool, json_logs_override: bool) {
    let json_format = json_logs_override || config.logging.format == "json";
    init(&level_for(config, verbose_override), json_format);
}

/// `--verbose` wins, then `verbose: false` quiets to warnings, then the configured level.
fn level_for(config: &augmento_core::Config, verbose_override: bool) -> String {
    if verbose_override {
        "debug".to_string()
    } else if !config.verbose {
        "warn".to_string()
    } else {
        config.logging.level.to_lowercase()
    }
}

//! Augmento CLI - multithreaded, seed-deterministic image augmentation.
//!
//! Augmento reads a JSON (or TOML) config naming an input directory, an
//! output directory and an ordered list of operations with probabilities,
//! then writes `iterations` augmented variants of every input image.
//!
//! # Usage
//!
//! ```bash
//! # Run a pipeline
//! augmento --config augment.json
//!
//! # Show the resolved plan without touching any image
//! augmento --config augment.json --dry-run
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

mod cli;
mod logging;

/// Augmento - apply randomized augmentation pipelines to image directories.
#[derive(Parser, Debug)]
#[command(name = "augmento")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the pipeline config (JSON, or TOML by extension)
    #[arg(short, long, env = "AUGMENTO_CONFIG")]
    config: PathBuf,

    /// Load the config, build the pipeline and list inputs without processing
    #[arg(long)]
    dry_run: bool,

    /// Interactive terminal UI (not available yet; runs normally)
    #[arg(long)]
    tui: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging depends on the config, so load errors are reported before it exists.
    let config = match augmento_core::Config::load_from(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info", cli.json_logs);
            return Err(e).with_context(|| format!("Failed to load config {:?}", cli.config));
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Augmento v{}", augmento_core::VERSION);

    cli::run::execute(
        config,
        cli::run::RunOptions {
            dry_run: cli.dry_run,
            tui: cli.tui,
        },
    )
}

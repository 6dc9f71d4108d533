//! The augmentation run: pipeline setup, dry-run plan, threaded execution.

mod progress;
mod setup;

use anyhow::Context;
use augmento_core::{Config, ThreadController};

use progress::{create_progress_bar, print_summary, ProgressSink};
use setup::{build_plan, open_sink, setup_run};

/// Flags that change how a run executes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub tui: bool,
}

/// Execute a run described by `config`.
pub fn execute(config: Config, options: RunOptions) -> anyhow::Result<()> {
    if options.tui {
        tracing::warn!("--tui is not implemented yet; continuing with the standard run");
    }

    let ctx = setup_run(&config)?;

    if options.dry_run {
        let plan = build_plan(&config, &ctx);
        println!("{}", serde_json::to_string_pretty(&plan)?);
        tracing::info!(
            "Dry run: {} inputs x {} iterations, nothing written",
            ctx.paths.len(),
            config.iterations
        );
        return Ok(());
    }

    let total = ctx.paths.len() as u64 * u64::from(config.iterations);
    let bar = create_progress_bar(total);
    let mut sink = ProgressSink::new(open_sink(&config)?, bar.clone());

    let summary = controller_for(&config, !bar.is_hidden())
        .run(&ctx.paths, config.iterations, &ctx.pipeline, &mut sink)
        .context("Augmentation run failed")?;

    bar.finish_and_clear();
    print_summary(&summary);

    if summary.saved > 0 {
        tracing::info!("Output written to {:?}", config.output_path());
    }
    Ok(())
}

/// Thread controller for the run. A visible progress bar replaces the
/// periodic "Saved N/M" log lines, which would otherwise break the bar.
fn controller_for(config: &Config, bar_visible: bool) -> ThreadController {
    let controller = ThreadController::from_config(config);
    if bar_visible {
        controller.with_progress_interval(0)
    } else {
        controller
    }
}

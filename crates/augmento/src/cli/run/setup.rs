//! Run setup: pipeline construction, input discovery, output sink.

use std::path::PathBuf;

use anyhow::Context;
use augmento_core::{Config, DirectorySink, FileDiscovery, OutputImageFormat, Pipeline};
use serde_json::{json, Value};

/// Pipeline and inputs, assembled before any thread starts.
pub struct RunContext {
    pub pipeline: Pipeline,
    pub paths: Vec<PathBuf>,
}

/// Build the pipeline and discover inputs.
pub fn setup_run(config: &Config) -> anyhow::Result<RunContext> {
    let seed = config.seed_or_random();
    if config.seed.is_none() {
        tracing::info!("No seed configured, using {} (set \"seed\" to reproduce this run)", seed);
    }

    let pipeline = Pipeline::from_specs(&config.pipeline, seed).context("Invalid pipeline")?;
    for entry in pipeline.entries() {
        tracing::debug!("  {} (p={})", entry.operation, entry.probability);
    }

    let paths = FileDiscovery::new(config.processing.clone()).discover_inputs(config);
    tracing::info!("Found {} input images", paths.len());

    Ok(RunContext { pipeline, paths })
}

/// Prepare the output directory (and manifest, with `save_history`).
pub fn open_sink(config: &Config) -> anyhow::Result<DirectorySink> {
    let format = OutputImageFormat::parse(&config.output.format)
        .with_context(|| format!("Unsupported output format {:?}", config.output.format))?;
    let mut sink = DirectorySink::new(config.output_path(), format)?;
    if config.save_history {
        sink = sink.with_manifest()?;
    }
    Ok(sink)
}

/// Describe what a run would do, for `--dry-run`.
pub fn build_plan(config: &Config, ctx: &RunContext) -> Value {
    let operations: Vec<Value> = ctx
        .pipeline
        .entries()
        .iter()
        .map(|entry| {
            json!({
                "operation": entry.operation.kind(),
                "description": entry.operation.describe(),
                "parameters": entry.operation.to_string(),
                "probability": entry.probability,
            })
        })
        .collect();

    json!({
        "seed": ctx.pipeline.base_seed(),
        "inputs": ctx.paths,
        "iterations": config.iterations,
        "total_tasks": ctx.paths.len() * config.iterations as usize,
        "num_threads": config.num_threads,
        "queue_capacity": config.queue_capacity,
        "output_dir": config.output_path(),
        "output_format": config.output.format,
        "save_history": config.save_history,
        "pipeline": operations,
    })
}

//! `run` command implementation.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(frame_rate) = args.frame_rate {
        info!(frame_rate, "Overriding frame rate from CLI");
        blueprint.scheduler.frame_rate = frame_rate;
    }

    info!(
        frame_rate = blueprint.scheduler.frame_rate,
        port_capacity = blueprint.scheduler.port_capacity,
        filters = blueprint.filters.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        max_frames: if args.max_frames == 0 {
            None
        } else {
            Some(args.max_frames)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            blueprint.metrics.port
        } else {
            Some(args.metrics_port)
        },
        blueprint,
    };

    let input = open_input(&args.input)?;
    let output = open_output(&args.output)?;

    info!("Starting pipeline...");

    let pipeline = Pipeline::new(pipeline_config);
    let stats = pipeline
        .run(input, output)
        .context("Pipeline execution failed")?;

    info!(
        frames_written = stats.frames_written,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Pipeline completed successfully"
    );

    // Print detailed statistics
    stats.print_summary();

    info!("calcgraph finished");
    Ok(())
}

/// Open the video source ("-" means stdin).
fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(BufReader::new(std::io::stdin())))
    } else {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input '{}'", path.display()))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Open the frame sink ("-" means stdout).
fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(BufWriter::new(std::io::stdout())))
    } else {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output '{}'", path.display()))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::FilterBlueprint) {
    eprintln!("\n=== Configuration Summary ===\n");
    eprintln!("Scheduler:");
    eprintln!("  Frame rate: {} fps", blueprint.scheduler.frame_rate);
    eprintln!("  Port capacity: {}", blueprint.scheduler.port_capacity);

    eprintln!("\nFilters ({}):", blueprint.filters.len());
    for filter in &blueprint.filters {
        eprintln!("  - {} ({})", filter.id, filter.params.kind_name());
    }

    match blueprint.metrics.port {
        Some(port) => eprintln!("\nMetrics: port {port}"),
        None => eprintln!("\nMetrics: disabled"),
    }

    eprintln!();
}

//! `info` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use contracts::FilterParams;

use crate::cli::InfoArgs;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Reading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let json = config_loader::ConfigLoader::to_json(&blueprint)
            .context("Failed to serialize configuration")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Configuration: {}", args.config.display());
    println!("  Version: {:?}", blueprint.version);

    println!("\nScheduler:");
    println!("  Frame rate: {} fps", blueprint.scheduler.frame_rate);
    println!(
        "  Frame budget: {:.3} ms",
        1000.0 / blueprint.scheduler.frame_rate as f64
    );
    println!("  Port capacity: {}", blueprint.scheduler.port_capacity);

    println!("\nFilter chain ({}):", blueprint.filters.len());
    for filter in &blueprint.filters {
        if args.filters {
            print_filter_detail(filter);
        } else {
            println!("  - {} ({})", filter.id, filter.params.kind_name());
        }
    }

    match blueprint.metrics.port {
        Some(port) => println!("\nMetrics: port {port}"),
        None => println!("\nMetrics: disabled"),
    }

    Ok(())
}

fn print_filter_detail(filter: &contracts::FilterConfig) {
    match &filter.params {
        FilterParams::Passthrough => {
            println!("  - {} (passthrough)", filter.id);
        }
        FilterParams::Pixelate { pixel_size, shape } => {
            println!("  - {} (pixelate)", filter.id);
            println!("      pixel_size: {pixel_size}");
            println!("      shape: {shape:?}");
        }
        FilterParams::Dither {
            red_levels,
            green_levels,
            blue_levels,
            spread,
            bayer_level,
        } => {
            println!("  - {} (dither)", filter.id);
            println!("      levels: r={red_levels} g={green_levels} b={blue_levels}");
            println!("      spread: {spread}");
            let matrix = 2u32 << (*bayer_level).min(2);
            println!("      bayer: {matrix}x{matrix} matrix");
        }
        FilterParams::Grayscale => {
            println!("  - {} (grayscale, Rec. 709)", filter.id);
        }
        FilterParams::Banner {
            path,
            offset_x,
            offset_y,
        } => {
            println!("  - {} (banner)", filter.id);
            println!("      path: {}", path.display());
            println!("      offset: ({offset_x}, {offset_y})");
        }
    }
}

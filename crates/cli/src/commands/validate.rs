//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    frame_rate: u32,
    port_capacity: usize,
    filter_count: usize,
    filter_kinds: Vec<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let filter_kinds = blueprint
                .filters
                .iter()
                .map(|filter| format!("{} ({})", filter.id, filter.params.kind_name()))
                .collect();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    frame_rate: blueprint.scheduler.frame_rate,
                    port_capacity: blueprint.scheduler.port_capacity,
                    filter_count: blueprint.filters.len(),
                    filter_kinds,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::FilterBlueprint) -> Vec<String> {
    use contracts::FilterParams;

    let mut warnings = Vec::new();

    if blueprint
        .filters
        .iter()
        .all(|filter| matches!(filter.params, FilterParams::Passthrough))
    {
        warnings.push("Chain contains only passthrough filters - frames pass unmodified".into());
    }

    for filter in &blueprint.filters {
        if let FilterParams::Pixelate { pixel_size: 1, .. } = filter.params {
            warnings.push(format!(
                "Filter '{}' has pixel_size 1, which is an identity transform",
                filter.id
            ));
        }
        if let FilterParams::Dither { spread: 0, .. } = filter.params {
            warnings.push(format!(
                "Filter '{}' has spread 0 - quantization without dithering",
                filter.id
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Frame rate: {} fps", summary.frame_rate);
            println!("  Port capacity: {}", summary.port_capacity);
            println!("  Filters: {}", summary.filter_count);
            for kind in &summary.filter_kinds {
                println!("    - {}", kind);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

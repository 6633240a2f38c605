//! 配置校验模块
//!
//! 校验规则：
//! - filter id 唯一
//! - 至少一个 filter
//! - frame_rate > 0, port_capacity > 0
//! - pixelate: pixel_size >= 1
//! - dither: 各通道 levels >= 2, bayer_level <= 2
//! - banner: path 非空

use std::collections::HashSet;

use ::validator::Validate;
use contracts::{FilterBlueprint, FilterParams, GraphError};

/// 校验 FilterBlueprint 配置
///
/// 先执行字段级校验 (validator derive)，再做跨字段检查。
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &FilterBlueprint) -> Result<(), GraphError> {
    blueprint
        .validate()
        .map_err(|e| GraphError::config_validation("blueprint", e.to_string()))?;
    validate_scheduler(blueprint)?;
    validate_filter_ids(blueprint)?;
    validate_filter_params(blueprint)?;
    Ok(())
}

/// 校验调度器参数
fn validate_scheduler(blueprint: &FilterBlueprint) -> Result<(), GraphError> {
    if blueprint.scheduler.frame_rate == 0 {
        return Err(GraphError::config_validation(
            "scheduler.frame_rate",
            "frame_rate must be >= 1",
        ));
    }
    if blueprint.scheduler.port_capacity == 0 {
        return Err(GraphError::config_validation(
            "scheduler.port_capacity",
            "port_capacity must be >= 1",
        ));
    }
    Ok(())
}

/// 校验 filter id 唯一性，且至少一个 filter
fn validate_filter_ids(blueprint: &FilterBlueprint) -> Result<(), GraphError> {
    if blueprint.filters.is_empty() {
        return Err(GraphError::config_validation(
            "filters",
            "at least one filter is required",
        ));
    }

    let mut seen = HashSet::new();
    for filter in &blueprint.filters {
        if filter.id.is_empty() {
            return Err(GraphError::config_validation(
                "filters[].id",
                "filter id cannot be empty",
            ));
        }
        if !seen.insert(&filter.id) {
            return Err(GraphError::config_validation(
                format!("filters[id={}]", filter.id),
                "duplicate filter id",
            ));
        }
    }
    Ok(())
}

/// 校验各 filter 的参数
fn validate_filter_params(blueprint: &FilterBlueprint) -> Result<(), GraphError> {
    for filter in &blueprint.filters {
        match &filter.params {
            FilterParams::Pixelate { pixel_size, .. } => {
                if *pixel_size == 0 {
                    return Err(GraphError::config_validation(
                        format!("filters[{}].pixel_size", filter.id),
                        "pixel_size must be >= 1",
                    ));
                }
            }
            FilterParams::Dither {
                red_levels,
                green_levels,
                blue_levels,
                bayer_level,
                ..
            } => {
                for (channel, levels) in [
                    ("red_levels", red_levels),
                    ("green_levels", green_levels),
                    ("blue_levels", blue_levels),
                ] {
                    if *levels < 2 {
                        return Err(GraphError::config_validation(
                            format!("filters[{}].{}", filter.id, channel),
                            format!("quantization levels must be >= 2, got {levels}"),
                        ));
                    }
                }
                if *bayer_level > 2 {
                    return Err(GraphError::config_validation(
                        format!("filters[{}].bayer_level", filter.id),
                        format!("bayer_level must be 0, 1 or 2, got {bayer_level}"),
                    ));
                }
            }
            FilterParams::Banner { path, .. } => {
                if path.as_os_str().is_empty() {
                    return Err(GraphError::config_validation(
                        format!("filters[{}].path", filter.id),
                        "banner path cannot be empty",
                    ));
                }
            }
            FilterParams::Passthrough | FilterParams::Grayscale => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, FilterConfig, MetricsConfig, PixelShape, SchedulerConfig};

    fn minimal_blueprint() -> FilterBlueprint {
        FilterBlueprint {
            version: ConfigVersion::V1,
            scheduler: SchedulerConfig::default(),
            filters: vec![
                FilterConfig {
                    id: "pixelate".into(),
                    params: FilterParams::Pixelate {
                        pixel_size: 4,
                        shape: PixelShape::Square,
                    },
                },
                FilterConfig {
                    id: "dither".into(),
                    params: FilterParams::Dither {
                        red_levels: 3,
                        green_levels: 6,
                        blue_levels: 3,
                        spread: 3,
                        bayer_level: 2,
                    },
                },
            ],
            metrics: MetricsConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_empty_filter_list() {
        let mut bp = minimal_blueprint();
        bp.filters.clear();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("at least one filter"), "got: {err}");
    }

    #[test]
    fn test_duplicate_filter_id() {
        let mut bp = minimal_blueprint();
        bp.filters.push(bp.filters[0].clone());
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate filter id"), "got: {err}");
    }

    #[test]
    fn test_zero_frame_rate() {
        let mut bp = minimal_blueprint();
        bp.scheduler.frame_rate = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("frame_rate"), "got: {err}");
    }

    #[test]
    fn test_zero_pixel_size() {
        let mut bp = minimal_blueprint();
        bp.filters[0].params = FilterParams::Pixelate {
            pixel_size: 0,
            shape: PixelShape::Square,
        };
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("pixel_size"), "got: {err}");
    }

    #[test]
    fn test_single_level_dither() {
        let mut bp = minimal_blueprint();
        bp.filters[1].params = FilterParams::Dither {
            red_levels: 1,
            green_levels: 6,
            blue_levels: 3,
            spread: 3,
            bayer_level: 2,
        };
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("red_levels"), "got: {err}");
    }

    #[test]
    fn test_bad_bayer_level() {
        let mut bp = minimal_blueprint();
        bp.filters[1].params = FilterParams::Dither {
            red_levels: 3,
            green_levels: 6,
            blue_levels: 3,
            spread: 3,
            bayer_level: 5,
        };
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("bayer_level"), "got: {err}");
    }

    #[test]
    fn test_empty_banner_path() {
        let mut bp = minimal_blueprint();
        bp.filters.push(FilterConfig {
            id: "banner".into(),
            params: FilterParams::Banner {
                path: std::path::PathBuf::new(),
                offset_x: 0,
                offset_y: 0,
            },
        });
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("banner path"), "got: {err}");
    }
}

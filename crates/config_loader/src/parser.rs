//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{FilterBlueprint, GraphError};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<FilterBlueprint, GraphError> {
    toml::from_str(content).map_err(|e| GraphError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<FilterBlueprint, GraphError> {
    serde_json::from_str(content).map_err(|e| GraphError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<FilterBlueprint, GraphError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FilterParams;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[scheduler]
frame_rate = 30

[[filters]]
id = "pixelate"
kind = "pixelate"
pixel_size = 8

[[filters]]
id = "grayscale"
kind = "grayscale"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.scheduler.frame_rate, 30);
        assert_eq!(bp.filters.len(), 2);
        assert!(matches!(
            bp.filters[0].params,
            FilterParams::Pixelate { pixel_size: 8, .. }
        ));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "scheduler": { "frame_rate": 60, "port_capacity": 16 },
            "filters": [
                { "id": "identity", "kind": "passthrough" }
            ]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        assert_eq!(result.unwrap().scheduler.port_capacity, 16);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, GraphError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_filter_kind() {
        let content = r#"
[[filters]]
id = "mystery"
kind = "sharpen"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}

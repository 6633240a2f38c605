//! # Config Loader
//!
//! 配置加载与解析模块。
//!
//! 负责：
//! - 解析 TOML/JSON 配置文件
//! - 校验配置合法性
//! - 生成 `FilterBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Filters: {}", blueprint.filters.len());
//! ```

mod parser;
mod validator;

pub use contracts::FilterBlueprint;
pub use parser::ConfigFormat;

use contracts::GraphError;
use std::path::Path;

/// 配置加载器
///
/// 提供从文件或字符串加载配置的静态方法。
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从文件路径加载配置
    ///
    /// 根据文件扩展名自动检测格式 (.toml / .json)。
    ///
    /// # Errors
    /// - 文件读取失败
    /// - 格式不支持
    /// - 解析失败
    /// - 校验失败
    pub fn load_from_path(path: &Path) -> Result<FilterBlueprint, GraphError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// 从字符串加载配置
    ///
    /// # Errors
    /// - 解析失败
    /// - 校验失败
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<FilterBlueprint, GraphError> {
        Self::parse_and_validate(content, format)
    }

    /// 将 FilterBlueprint 序列化为 TOML 字符串
    pub fn to_toml(blueprint: &FilterBlueprint) -> Result<String, GraphError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| GraphError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// 将 FilterBlueprint 序列化为 JSON 字符串
    pub fn to_json(blueprint: &FilterBlueprint) -> Result<String, GraphError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| GraphError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// 根据文件扩展名推断配置格式
    fn detect_format(path: &Path) -> Result<ConfigFormat, GraphError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            GraphError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| GraphError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// 读取配置文件内容
    fn read_file(path: &Path) -> Result<String, GraphError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// 解析并校验配置内容
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<FilterBlueprint, GraphError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

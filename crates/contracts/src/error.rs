//! 错误分层定义
//!
//! 按来源分层：packet / context / scheduler / config

use thiserror::Error;

use crate::Tag;

/// 统一错误类型
#[derive(Debug, Error)]
pub enum GraphError {
    // ===== Packet 错误 =====
    /// 无效 packet（空载荷 + 哨兵时间戳）
    #[error("packet is empty")]
    EmptyPacket,

    /// 载荷类型不匹配
    #[error("packet type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    // ===== Context 错误 =====
    /// 端口 tag 未注册
    #[error("no {direction} port registered under tag '{tag}'")]
    UnknownPort { direction: &'static str, tag: Tag },

    /// side parameter tag 未注册
    #[error("no side parameter registered under tag '{tag}'")]
    UnknownSideParameter { tag: Tag },

    // ===== Scheduler 错误 =====
    /// 管道为空
    #[error("no calculators registered in the pipeline")]
    EmptyPipeline,

    /// 调度器状态非法
    #[error("scheduler in invalid state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// calculator 重名
    #[error("calculator '{name}' is already registered")]
    DuplicateCalculator { name: String },

    /// calculator 执行失败
    #[error("calculator '{name}' failed: {message}")]
    Calculator { name: String, message: String },

    // ===== 配置错误 =====
    /// 配置解析错误
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// 配置校验错误
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== 通用错误 =====
    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 其他错误
    #[error("{0}")]
    Other(String),
}

impl GraphError {
    /// 创建输入端口未注册错误
    pub fn unknown_input_port(tag: impl Into<Tag>) -> Self {
        Self::UnknownPort {
            direction: "input",
            tag: tag.into(),
        }
    }

    /// 创建输出端口未注册错误
    pub fn unknown_output_port(tag: impl Into<Tag>) -> Self {
        Self::UnknownPort {
            direction: "output",
            tag: tag.into(),
        }
    }

    /// 创建 calculator 执行错误
    pub fn calculator(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Calculator {
            name: name.into(),
            message: message.into(),
        }
    }

    /// 创建配置解析错误
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// 创建配置校验错误
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

//! Agent 错误类型
//!
//! 标签缺失与未知工具在循环内部就地恢复，不会出现在这里；
//! 网关失败、工具参数/执行失败、路径逃逸等对本次 run 都是致命错误，经 `?` 向调用方传播。

use thiserror::Error;

/// 运行过程中可能出现的致命错误（网关、解析、工具、路径逃逸等）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    /// tool 标签存在但结构不完整（缺 name 属性、未闭合等）
    #[error("Malformed tool tag: {0}")]
    MalformedToolTag(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("Path escape attempt: {0}")]
    PathEscape(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

//! Duet - Rust 双智能体代码生成系统
//!
//! 模块划分：
//! - **agents**: Agent 契约、响应语法解析、Producer（工具循环）与 Critic（单次评审）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型与 Orchestrator 主控循环
//! - **llm**: 文本生成网关抽象与实现（OpenAI 兼容 / Mock）
//! - **tools**: 能力协议（Tool trait、注册表、执行器）与沙箱文件系统工具

pub mod agents;
pub mod config;
pub mod core;
pub mod llm;
pub mod tools;

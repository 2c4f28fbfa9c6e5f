//! 文本生成网关抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 LlmClient：generate 接收完整 prompt，返回生成文本。
//! 语义刻意收窄为 prompt 进、文本出：流式后端应在内部缓冲后一次性返回。

use async_trait::async_trait;

/// 网关 trait：每次调用 await 到结束；失败携带后端错误信息，由调用方转为 AgentError::LlmError
#[async_trait]
pub trait LlmClient: Send + Sync + std::fmt::Debug {
    async fn generate(&self, prompt: &str) -> Result<String, String>;
}

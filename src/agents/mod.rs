//! Agent 层：共享契约、响应语法解析、Producer / Critic 两个变体
//!
//! 变体之间无共享可变状态，每次 execute 仅依赖入参自洽完成。

pub mod critic;
pub mod producer;
pub mod response;

use async_trait::async_trait;

use crate::core::AgentError;

pub use critic::{is_approved, CriticAgent, APPROVAL_SENTINEL, CRITIC_ROLE};
pub use producer::{ProducerAgent, PRODUCER_ROLE};
pub use response::{parse_response, ParsedResponse, ResultTag, ToolInvocation};

/// 一次 Agent 调用的产出：私有推理与公开交付物，产生后不再修改
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub reasoning: String,
    pub result: String,
}

/// Agent 共享契约：名称、角色（拼入提示词的人设指令）、可用能力名、执行任务
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn role(&self) -> &str;

    /// 可调用的能力名列表；无能力的变体返回空
    fn tool_names(&self) -> Vec<String> {
        Vec::new()
    }

    async fn execute(&self, task: &str) -> Result<AgentOutput, AgentError>;
}

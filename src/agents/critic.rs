//! Critic：单次评审方
//!
//! 每次 execute 恰好一次网关调用：提示词拼人设、待评审 artifact 与「无需修改时以通过记号收尾」
//! 的指令，从回复中解析 thinking / feedback；不调用任何能力。

use std::sync::Arc;

use async_trait::async_trait;

use crate::agents::response::{parse_response, ResultTag};
use crate::agents::{Agent, AgentOutput};
use crate::core::AgentError;
use crate::llm::LlmClient;

/// Critic 默认人设
pub const CRITIC_ROLE: &str =
    "You are a senior software engineer who meticulously reviews code for quality, correctness, and style.";

/// 通过记号：反馈文本包含此记号即视为通过
pub const APPROVAL_SENTINEL: &str = "[APPROVED]";

/// 区分大小写的原样子串匹配，不剥离尾部标点。
/// 已知限制：Critic 在反馈中引用记号本身（如解释为何暂不通过）同样会触发终止。
pub fn is_approved(feedback: &str) -> bool {
    feedback.contains(APPROVAL_SENTINEL)
}

/// Critic：持有网关与人设
pub struct CriticAgent {
    llm: Arc<dyn LlmClient>,
    role: String,
}

impl CriticAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            role: CRITIC_ROLE.to_string(),
        }
    }

    /// 覆盖默认人设
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    fn review_prompt(&self, task: &str) -> String {
        format!(
            "{role}\n\n\
             Respond in the following form:\n\
             <thinking>your reasoning</thinking>\n\
             <feedback>your review feedback</feedback>\n\n\
             If no further changes are needed, end the feedback with {sentinel}.\n\n\
             {task}\n",
            role = self.role,
            sentinel = APPROVAL_SENTINEL,
            task = task,
        )
    }
}

#[async_trait]
impl Agent for CriticAgent {
    fn name(&self) -> &str {
        "Critic"
    }

    fn role(&self) -> &str {
        &self.role
    }

    async fn execute(&self, task: &str) -> Result<AgentOutput, AgentError> {
        let prompt = self.review_prompt(task);
        let output = self
            .llm
            .generate(&prompt)
            .await
            .map_err(AgentError::LlmError)?;
        let parsed = parse_response(&output, ResultTag::Feedback)?;
        Ok(AgentOutput {
            reasoning: parsed.reasoning,
            result: parsed.result,
        })
    }
}

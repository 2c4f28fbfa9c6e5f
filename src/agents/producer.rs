//! Producer：工具循环中的代码生成方
//!
//! 在固定步数预算内反复调用网关：回复含 tool 标签则执行对应能力并把结果拼回下一轮提示词，
//! 未知工具名拼入 "not found" 提示后继续（可恢复）；回复不含 tool 标签即为最终交付。
//! 工具结果走提示词回灌而非旁路状态，Agent 在两次调用之间完全无状态，每一步都可由其提示词复现。

use std::sync::Arc;

use async_trait::async_trait;

use crate::agents::response::{parse_response, ResultTag};
use crate::agents::{Agent, AgentOutput};
use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::tools::ToolExecutor;

/// Producer 默认人设
pub const PRODUCER_ROLE: &str =
    "You are a world-class software engineer who writes clean, efficient, and well-documented code.";

/// Producer：持有网关、工具执行器与步数上限
pub struct ProducerAgent {
    llm: Arc<dyn LlmClient>,
    role: String,
    executor: ToolExecutor,
    max_steps: usize,
}

impl ProducerAgent {
    pub fn new(llm: Arc<dyn LlmClient>, executor: ToolExecutor, max_steps: usize) -> Self {
        Self {
            llm,
            role: PRODUCER_ROLE.to_string(),
            executor,
            max_steps,
        }
    }

    /// 覆盖默认人设
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// 初始提示词：人设 + 工具清单 + 响应语法 + 任务
    fn initial_prompt(&self, task: &str) -> String {
        let mut tools_block = String::new();
        for (name, description) in self.executor.tool_descriptions() {
            tools_block.push_str(&format!("- {}: {}\n", name, description));
        }

        format!(
            "{role}\n\n\
             Available tools:\n{tools}\n\
             Respond in exactly one of two forms.\n\n\
             To call a tool (at most one per response):\n\
             <thinking>why this tool is needed</thinking>\n\
             <tool name=\"TOOL_NAME\" args='{{\"key\": \"value\"}}' />\n\n\
             To deliver the finished code:\n\
             <thinking>your reasoning</thinking>\n\
             <code>the complete artifact</code>\n\n\
             Task:\n{task}\n",
            role = self.role,
            tools = tools_block,
            task = task,
        )
    }

    fn step_limit_notice(&self) -> String {
        format!(
            "Turn limit exceeded: no final artifact after {} steps.",
            self.max_steps
        )
    }
}

#[async_trait]
impl Agent for ProducerAgent {
    fn name(&self) -> &str {
        "Producer"
    }

    fn role(&self) -> &str {
        &self.role
    }

    fn tool_names(&self) -> Vec<String> {
        self.executor.tool_names()
    }

    /// 工具循环：步数预算内，tool 回复执行能力并回灌提示词，非 tool 回复即最终交付；
    /// 预算耗尽返回带 "Turn limit exceeded" 的哨兵结果，不抛错
    async fn execute(&self, task: &str) -> Result<AgentOutput, AgentError> {
        let mut prompt = self.initial_prompt(task);
        let mut last_reasoning = String::new();

        for step in 0..self.max_steps {
            let output = self
                .llm
                .generate(&prompt)
                .await
                .map_err(AgentError::LlmError)?;
            let parsed = parse_response(&output, ResultTag::Code)?;
            if !parsed.reasoning.is_empty() {
                last_reasoning = parsed.reasoning.clone();
            }

            // tool 标签优先于 code 标签：模型仍在过程中，尚未定稿
            let Some(invocation) = parsed.invocation else {
                return Ok(AgentOutput {
                    reasoning: parsed.reasoning,
                    result: parsed.result,
                });
            };

            tracing::info!(step, tool = %invocation.tool, "producer tool call");
            if self.executor.contains(&invocation.tool) {
                // 工具执行失败（含超时、参数缺失）对本次 run 是致命的，直接传播
                let result = self.executor.execute(&invocation.tool, invocation.args).await?;
                prompt.push_str(&format!(
                    "\n\nPrevious reasoning:\n{}\n\nTool {} returned:\n{}\n\n\
                     Continue with the task using this result.\n",
                    parsed.reasoning, invocation.tool, result
                ));
            } else {
                tracing::warn!(tool = %invocation.tool, "producer requested unknown tool");
                prompt.push_str(&format!(
                    "\n\nPrevious reasoning:\n{}\n\nTool {} was not found. Available tools: {}.\n\n\
                     Continue with the task without it.\n",
                    parsed.reasoning,
                    invocation.tool,
                    self.executor.tool_names().join(", ")
                ));
            }
        }

        Ok(AgentOutput {
            reasoning: last_reasoning,
            result: self.step_limit_notice(),
        })
    }
}

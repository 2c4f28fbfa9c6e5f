//! Orchestrator：Producer/Critic 主控循环
//!
//! run(task, app_id) 驱动至多 max_turns 个回合：Producer 产出 artifact 并记入历史，
//! Critic 评审后记入历史；反馈含通过记号立即返回，否则把「原始请求 + 上一版 artifact + 反馈」
//! 确定性地重组为下一回合任务，Producer 每轮都拿到完整上下文，Agent 自身不携带隐藏状态。
//! 回合预算耗尽带回最后一版 artifact 与完整历史，属正常终止而非失败。

use std::path::PathBuf;
use std::sync::Arc;

use crate::agents::{is_approved, Agent, AgentOutput, CriticAgent, ProducerAgent};
use crate::config::AppConfig;
use crate::core::AgentError;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};
use crate::tools::{FileSystemTool, ToolExecutor, ToolRegistry};

/// 历史条目：每次 Agent 调用追加一条，按发生顺序排列
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub agent_name: String,
    pub reasoning: String,
    pub result: String,
}

/// 一次 run 的返回：最终 artifact 与完整对话历史
#[derive(Debug, Clone)]
pub struct OrchestratorResult {
    pub final_artifact: String,
    pub history: Vec<ConversationTurn>,
}

/// 按配置选择网关后端（openai / mock），构造时注入、运行中不再探测环境；
/// 未知的 provider（含拼写错误）是配置错误，不做静默回落
pub fn create_llm_from_config(cfg: &AppConfig) -> Result<Arc<dyn LlmClient>, AgentError> {
    match cfg.llm.provider.to_lowercase().as_str() {
        "mock" => {
            tracing::warn!("Using Mock LLM (offline, scripted responses only)");
            Ok(Arc::new(MockLlmClient::default()))
        }
        "openai" => {
            tracing::info!("Using OpenAI-compatible LLM ({})", cfg.llm.model);
            Ok(Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &cfg.llm.model,
                None,
            )))
        }
        other => Err(AgentError::ConfigError(format!(
            "Unknown LLM provider: {} (expected openai or mock)",
            other
        ))),
    }
}

/// Orchestrator：持有网关与循环配置，每次 run 按 app_id 构造沙箱化的 Agent 组
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    workspace_root: PathBuf,
    max_turns: usize,
    max_steps: usize,
    tool_timeout_secs: u64,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, cfg: &AppConfig) -> Self {
        let workspace_root = cfg
            .app
            .workspace_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("workspace"));
        Self {
            llm,
            workspace_root,
            max_turns: cfg.orchestrator.max_turns,
            max_steps: cfg.producer.max_steps,
            tool_timeout_secs: cfg.tools.tool_timeout_secs,
        }
    }

    /// 按 app_id 构造 Producer：fs 工具沙箱限定在 workspace_root/app-{id} 下；
    /// 沙箱目录建不出来时立即报配置错误，不留到工具调用时才暴露
    fn build_producer(&self, app_id: u64) -> Result<ProducerAgent, AgentError> {
        let sandbox = self.workspace_root.join(format!("app-{}", app_id));
        std::fs::create_dir_all(&sandbox).map_err(|e| {
            AgentError::ConfigError(format!(
                "Failed to create sandbox {}: {}",
                sandbox.display(),
                e
            ))
        })?;

        let mut tools = ToolRegistry::new();
        tools.register(FileSystemTool::new(&sandbox));
        let executor = ToolExecutor::new(tools, self.tool_timeout_secs);
        Ok(ProducerAgent::new(self.llm.clone(), executor, self.max_steps))
    }

    /// 驱动 Producer/Critic 回合直到通过或回合预算耗尽
    pub async fn run(&self, task: &str, app_id: u64) -> Result<OrchestratorResult, AgentError> {
        if self.max_turns == 0 {
            return Err(AgentError::ConfigError(
                "max_turns must be at least 1".to_string(),
            ));
        }

        let producer = self.build_producer(app_id)?;
        let critic = CriticAgent::new(self.llm.clone());

        let mut history: Vec<ConversationTurn> = Vec::new();
        let mut current_task = task.to_string();
        let mut final_artifact = String::new();

        for turn in 0..self.max_turns {
            tracing::info!(turn = turn + 1, max_turns = self.max_turns, "orchestrator turn");

            let produced = producer.execute(&current_task).await?;
            final_artifact = produced.result.clone();
            push_turn(&mut history, &producer, &produced);

            let review_task = format!("Please review the following code:\n{}", final_artifact);
            let feedback = critic.execute(&review_task).await?;
            let approved = is_approved(&feedback.result);
            push_turn(&mut history, &critic, &feedback);

            if approved {
                tracing::info!(turn = turn + 1, "critic approved artifact");
                return Ok(OrchestratorResult {
                    final_artifact,
                    history,
                });
            }

            current_task = format!(
                "The user's initial request was: \"{}\". The previous code you wrote was:\n{}\n\n\
                 The reviewer's feedback is: \"{}\". Please rewrite the code to incorporate the feedback.",
                task, final_artifact, feedback.result
            );
        }

        tracing::info!(max_turns = self.max_turns, "turn budget exhausted without approval");
        Ok(OrchestratorResult {
            final_artifact,
            history,
        })
    }
}

fn push_turn(history: &mut Vec<ConversationTurn>, agent: &dyn Agent, output: &AgentOutput) {
    history.push(ConversationTurn {
        agent_name: agent.name().to_string(),
        reasoning: output.reasoning.clone(),
        result: output.result.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn test_config(workspace: &std::path::Path, max_turns: usize) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.app.workspace_root = Some(workspace.to_path_buf());
        cfg.orchestrator.max_turns = max_turns;
        cfg
    }

    #[tokio::test]
    async fn test_zero_max_turns_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let orchestrator = Orchestrator::new(llm.clone(), &test_config(dir.path(), 0));

        let err = orchestrator.run("task", 1).await.unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sandbox_creation_failure_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        // workspace_root 指向一个普通文件，app 子目录必然建不出来
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, "not a directory").unwrap();
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let orchestrator = Orchestrator::new(llm.clone(), &test_config(&blocker, 2));

        let err = orchestrator.run("task", 1).await.unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "opnai".to_string();
        let err = create_llm_from_config(&cfg).unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(_)));
        assert!(err.to_string().contains("opnai"));
    }

    #[test]
    fn test_known_providers_construct() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".to_string();
        assert!(create_llm_from_config(&cfg).is_ok());
        cfg.llm.provider = "OpenAI".to_string();
        assert!(create_llm_from_config(&cfg).is_ok());
    }

    #[tokio::test]
    async fn test_gateway_failure_is_fatal_for_run() {
        let dir = tempfile::tempdir().unwrap();
        // Producer 第一次调用就遇到网关错误
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let orchestrator = Orchestrator::new(llm, &test_config(dir.path(), 2));

        let err = orchestrator.run("task", 1).await.unwrap_err();
        assert!(matches!(err, AgentError::LlmError(_)));
    }
}

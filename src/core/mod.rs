//! 核心编排层：错误类型与 Producer/Critic 主控循环

pub mod error;
pub mod orchestrator;

pub use error::AgentError;
pub use orchestrator::{
    create_llm_from_config, ConversationTurn, Orchestrator, OrchestratorResult,
};

//! Duet - Rust 双智能体代码生成系统
//!
//! 入口：初始化日志、加载配置、构造网关与 Orchestrator，跑单个任务并打印对话历史与最终 artifact。

use anyhow::Context;
use duet::config::{load_config, AppConfig};
use duet::core::{create_llm_from_config, Orchestrator};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let task: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if task.is_empty() {
        anyhow::bail!("Usage: duet <task description>");
    }

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let llm = create_llm_from_config(&cfg).context("Failed to construct LLM gateway")?;
    let orchestrator = Orchestrator::new(llm, &cfg);

    // app id 固定为 1：CLI 是单应用场景；嵌入方（HTTP/IPC）按自身会话传入
    let result = orchestrator
        .run(&task, 1)
        .await
        .context("Orchestrator run failed")?;

    for turn in &result.history {
        println!("=== {} ===", turn.agent_name);
        if !turn.reasoning.is_empty() {
            println!("[reasoning]\n{}\n", turn.reasoning);
        }
        println!("{}\n", turn.result);
    }
    println!("=== Final artifact ===\n{}", result.final_artifact);

    Ok(())
}

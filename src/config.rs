//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `DUET__*` 覆盖（双下划线表示嵌套，如 `DUET__LLM__PROVIDER=mock`）。
//! 回合数 / 步数上限、工具超时、沙箱根目录都在这里，不散落为字面量。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
    #[serde(default)]
    pub producer: ProducerSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

/// [app] 段：应用名、沙箱根目录
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 沙箱根目录，未设置时用 ./workspace；每次 run 在其下使用 app-{id} 子目录
    pub workspace_root: Option<PathBuf>,
}

/// [llm] 段：网关后端选择
///
/// serde 的 default = "fn" 只在反序列化时生效，Default 必须手写调用同一组
/// default_* 函数，保证 AppConfig::default() 与缺段反序列化得到同样的值。
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai / mock；构造时按此注入具体网关，不在运行中探测环境
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// OpenAI 兼容端点地址（DeepSeek、自建代理等）
    pub base_url: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// [orchestrator] 段：Producer/Critic 回合上限
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSection {
    /// 一个回合 = 一次 Producer 调用 + 一次 Critic 调用
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_turns() -> usize {
    2
}

/// [producer] 段：工具循环步数上限
#[derive(Debug, Clone, Deserialize)]
pub struct ProducerSection {
    /// 单次 execute 内最大网关调用次数，防止工具调用死循环
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

impl Default for ProducerSection {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

fn default_max_steps() -> usize {
    5
}

/// [tools] 段：工具超时
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            orchestrator: OrchestratorSection::default(),
            producer: ProducerSection::default(),
            tools: ToolsSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 DUET__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 DUET__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("DUET")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.orchestrator.max_turns, 2);
        assert_eq!(cfg.producer.max_steps, 5);
        assert_eq!(cfg.tools.tool_timeout_secs, 30);
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert!(cfg.llm.base_url.is_none());
    }

    #[test]
    fn test_section_defaults_match_deserialized_defaults() {
        // Default 手写实现必须与 serde 缺键回落取同一组值
        let from_empty: AppConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let from_default = AppConfig::default();
        assert_eq!(from_empty.llm.provider, from_default.llm.provider);
        assert_eq!(from_empty.llm.model, from_default.llm.model);
        assert_eq!(
            from_empty.orchestrator.max_turns,
            from_default.orchestrator.max_turns
        );
        assert_eq!(from_empty.producer.max_steps, from_default.producer.max_steps);
        assert_eq!(
            from_empty.tools.tool_timeout_secs,
            from_default.tools.tool_timeout_secs
        );
    }
}

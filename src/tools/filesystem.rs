//! 沙箱文件系统工具
//!
//! SafeFs 绑定 root_dir，所有路径必须解析在 root 下（禁止绝对路径与 ../ 逃逸）；
//! FileSystemTool 基于 SafeFs 提供 readFile / writeFile 两种 operation，
//! 参数形如 {"operation": "writeFile", "path": "src/add.ts", "content": "..."}。

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::core::AgentError;
use crate::tools::Tool;

/// 沙箱文件系统：绑定根目录，读写前校验路径在根下，防止路径逃逸
#[derive(Debug, Clone)]
pub struct SafeFs {
    root_dir: PathBuf,
}

impl SafeFs {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        let root = root_dir.as_ref().to_path_buf();
        let root_dir = root.canonicalize().unwrap_or(root);
        Self { root_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// 词法校验：拒绝绝对路径与任何 .. 分量，返回根下的完整路径
    ///
    /// 写入目标可能还不存在，不能依赖 canonicalize，因此先做词法检查。
    fn confine(&self, path: &str) -> Result<PathBuf, AgentError> {
        let rel = Path::new(path.trim_start_matches("./"));
        if rel.is_absolute() {
            return Err(AgentError::PathEscape(path.to_string()));
        }
        for component in rel.components() {
            if matches!(component, Component::ParentDir) {
                return Err(AgentError::PathEscape(path.to_string())); // 如 ../../etc/passwd
            }
        }
        Ok(self.root_dir.join(rel))
    }

    /// 读取路径校验：词法检查后再 canonicalize，确认真实路径（含符号链接）仍在根下
    pub fn resolve_read(&self, path: &str) -> Result<PathBuf, AgentError> {
        let full = self.confine(path)?;
        let canonical = full
            .canonicalize()
            .map_err(|_| AgentError::ToolExecutionFailed(format!("Path not found: {}", path)))?;
        if canonical.starts_with(&self.root_dir) {
            Ok(canonical)
        } else {
            Err(AgentError::PathEscape(path.to_string()))
        }
    }

    pub fn read_file(&self, path: &str) -> Result<String, AgentError> {
        let resolved = self.resolve_read(path)?;
        std::fs::read_to_string(&resolved)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("Read failed: {}", e)))
    }

    /// 写入文件，父目录不存在时自动创建
    pub fn write_file(&self, path: &str, content: &str) -> Result<PathBuf, AgentError> {
        let resolved = self.confine(path)?;
        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AgentError::ToolExecutionFailed(format!("Failed to create parent directory: {}", e))
            })?;
        }
        std::fs::write(&resolved, content)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("Write failed: {}", e)))?;
        Ok(resolved)
    }
}

/// 文件系统工具：Producer 可用的唯一副作用能力，读写都限制在 app 级沙箱内
pub struct FileSystemTool {
    fs: SafeFs,
}

impl FileSystemTool {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            fs: SafeFs::new(root_dir),
        }
    }
}

#[async_trait]
impl Tool for FileSystemTool {
    fn name(&self) -> &str {
        "fs"
    }

    fn description(&self) -> &str {
        "Read and write files in the app workspace. Args: {\"operation\": \"readFile\" or \"writeFile\", \"path\": \"relative path\", \"content\": \"required for writeFile\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let operation = args
            .get("operation")
            .and_then(|v| v.as_str())
            .ok_or("Missing required parameter: operation")?;
        let path = args
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or("Missing required parameter: path")?;
        tracing::info!(operation = %operation, path = %path, "fs tool execute");

        match operation {
            "readFile" => self.fs.read_file(path).map_err(|e| e.to_string()),
            "writeFile" => {
                let content = args
                    .get("content")
                    .and_then(|v| v.as_str())
                    .ok_or("Content is required for writeFile operation.")?;
                let written = self.fs.write_file(path, content).map_err(|e| e.to_string())?;
                Ok(format!(
                    "Wrote {} bytes to {}",
                    content.len(),
                    written.display()
                ))
            }
            other => Err(format!("Unknown operation: {}", other)),
        }
    }
}

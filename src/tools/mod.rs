//! 能力层：Tool trait、注册表、带超时的执行器、沙箱文件系统工具

pub mod executor;
pub mod filesystem;
pub mod registry;

pub use executor::ToolExecutor;
pub use filesystem::{FileSystemTool, SafeFs};
pub use registry::{Tool, ToolRegistry};

//! Built-in tools bundled with aibot.

mod calculator;
mod code_exec;
mod file_reader;
mod utils;

use crate::ToolRegistry;
use aibot_rs_config::ToolsConfig;
use log::info;
use std::sync::Arc;

pub use calculator::{CalculatorTool, evaluate, extract_expression, format_number};
pub use code_exec::{CodeExecTool, extract_code_block};
pub use file_reader::FileReaderTool;

/// Register the built-in tools enabled in `config`.
pub fn register_builtin_tools(registry: &ToolRegistry, config: &ToolsConfig) {
    if config.calculator.enabled {
        registry.register(Arc::new(CalculatorTool));
    }
    if config.file_reader.enabled {
        registry.register(Arc::new(FileReaderTool::new(&config.file_reader.path)));
    }
    if config.code_execution.enabled {
        registry.register(Arc::new(CodeExecTool));
    }
    info!("registered built-in tools (names={:?})", registry.list());
}

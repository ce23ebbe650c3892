//! Tools the chat loop can run before asking the model: an arithmetic
//! calculator, a workspace file reader and an opt-in code runner.

pub mod builtins;
pub mod context;
pub mod registry;
pub mod tool;

pub use builtins::{
    CalculatorTool, CodeExecTool, FileReaderTool, extract_code_block, extract_expression,
    register_builtin_tools,
};
pub use context::{ExecLimits, ToolContext};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolSpec};

pub use aibot_rs_protocol::ToolError;

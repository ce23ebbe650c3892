use crate::context::ToolContext;
use aibot_rs_protocol::ToolError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Name, description and argument schema of a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub args_schema: Value,
}

/// A capability the chat loop can invoke with JSON arguments.
///
/// Failures are returned as [`ToolError`]; the chat loop renders them into the
/// reply rather than aborting the turn.
#[async_trait]
pub trait Tool: Send + Sync + std::fmt::Debug {
    /// Registry key, e.g. `"Calculator"`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the accepted arguments.
    fn args_schema(&self) -> Value;

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            args_schema: self.args_schema(),
        }
    }
}

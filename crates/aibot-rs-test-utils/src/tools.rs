use aibot_rs_protocol::ToolError;
use aibot_rs_tools::{Tool, ToolContext};
use async_trait::async_trait;
use serde_json::{Value, json};

/// Tool answering every call with the same JSON value or the same failure.
#[derive(Debug, Clone)]
pub struct DummyTool {
    name: &'static str,
    output: Result<Value, String>,
}

impl DummyTool {
    pub fn returning(name: &'static str, output: Value) -> Self {
        Self {
            name,
            output: Ok(output),
        }
    }

    pub fn failing(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            output: Err(message.into()),
        }
    }
}

#[async_trait]
impl Tool for DummyTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "dummy"
    }

    fn args_schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn call(&self, _ctx: &ToolContext, _args: Value) -> Result<Value, ToolError> {
        self.output.clone().map_err(ToolError::ExecutionFailed)
    }
}

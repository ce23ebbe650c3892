//! Test helpers shared across aibot crates.

pub mod llm;
pub mod tools;
pub mod traces;

pub use llm::{StubLLM, StubReply};
pub use tools::DummyTool;
pub use traces::{FailingTraceStore, RecordingExporter};

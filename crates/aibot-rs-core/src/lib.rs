//! Chat loop, request metadata enrichment, and dashboard views for aibot.

pub mod dashboard;
pub mod error;
pub mod metadata;
pub mod provider;
pub mod runner;
pub mod session;

pub use dashboard::{DashboardRow, dashboard_rows, role_options, session_options};
pub use error::{CoreError, MetadataError};
pub use metadata::{
    GeoInfo, GeoLookup, IpInfoLookup, MetadataCollector, RequestContext, describe_user_agent,
};
pub use provider::build_llm_provider;
pub use runner::{TurnOutcome, TurnRunner, TurnRunnerBuilder};
pub use session::{ChatSession, HistoryEntry};

//! Read-side view of the trace log.

use aibot_rs_protocol::{ALL_OPTION, Metadata, Role, TraceId, TurnRecord, UNKNOWN};
use serde::Serialize;

/// Display format for record times (UTC).
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One expandable entry on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    pub time: String,
    pub role: Role,
    pub trace_id: TraceId,
    pub content: Option<String>,
    pub metadata: Metadata,
}

impl DashboardRow {
    pub fn from_record(record: &TurnRecord) -> Self {
        let time = record
            .datetime()
            .map(|at| at.format(TIME_FORMAT).to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            time,
            role: record.role,
            trace_id: record.trace_id.clone(),
            content: record.content.clone(),
            metadata: record.metadata.clone(),
        }
    }

    /// `"<time> | <role> | Trace ID: <trace_id>"`
    pub fn label(&self) -> String {
        format!("{} | {} | Trace ID: {}", self.time, self.role, self.trace_id)
    }
}

pub fn dashboard_rows(records: &[TurnRecord]) -> Vec<DashboardRow> {
    records.iter().map(DashboardRow::from_record).collect()
}

/// Session selector values: `"All"` followed by the sorted sessions.
pub fn session_options(sessions: &[String]) -> Vec<String> {
    std::iter::once(ALL_OPTION.to_string())
        .chain(sessions.iter().cloned())
        .collect()
}

/// Role selector values: `"All"`, `"user"`, `"assistant"`.
pub fn role_options() -> Vec<String> {
    std::iter::once(ALL_OPTION.to_string())
        .chain(Role::ALL.iter().map(|role| role.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn row_formats_time_and_label() {
        let mut metadata = Metadata::new();
        metadata.insert("session_id".to_string(), json!("s1"));
        let record = TurnRecord::new(Role::Assistant, "4", "abc12345", metadata, 1_700_000_000.75);
        let row = DashboardRow::from_record(&record);
        assert_eq!(row.time, "2023-11-14 22:13:20");
        assert_eq!(
            row.label(),
            "2023-11-14 22:13:20 | assistant | Trace ID: abc12345"
        );
    }

    #[test]
    fn selector_options() {
        assert_eq!(role_options(), vec!["All", "user", "assistant"]);
        assert_eq!(
            session_options(&["s1".to_string(), "unknown".to_string()]),
            vec!["All", "s1", "unknown"]
        );
    }
}

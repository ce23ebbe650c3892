//! Wire types shared by the trace store, the chat loop, and the HTTP surface.

mod filter;
mod tool;

pub use filter::{ALL_OPTION, TraceFilter, distinct_sessions};
pub use tool::ToolError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Sentinel used when a metadata lookup fails or a key is absent.
pub const UNKNOWN: &str = "unknown";
/// Metadata key carrying the session identifier.
pub const SESSION_ID_KEY: &str = "session_id";
/// Metadata key carrying the 1-based turn index.
pub const TURN_KEY: &str = "turn";
/// Number of characters kept from a UUID when minting a trace id.
pub const TRACE_ID_LEN: usize = 8;

/// Open-ended record metadata (device, ip, city, session_id, turn, ...).
pub type Metadata = Map<String, Value>;
/// Identifier for a chat session.
pub type SessionId = String;
/// Short identifier shared by both records of a turn.
pub type TraceId = String;

/// Author of a logged chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Every role, in dashboard selector order.
    pub const ALL: [Role; 2] = [Role::User, Role::Assistant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role string is neither `user` nor `assistant`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// One chat message in the trace log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnRecord {
    /// Author of the message.
    pub role: Role,
    /// Message body. `None` only for externally written logs carrying `null`.
    #[serde(default)]
    pub content: Option<String>,
    /// Trace id shared with the other record of the same turn.
    pub trace_id: TraceId,
    /// Request metadata captured for the turn.
    #[serde(default, deserialize_with = "metadata_or_empty")]
    pub metadata: Metadata,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

impl TurnRecord {
    pub fn new(
        role: Role,
        content: impl Into<String>,
        trace_id: impl Into<TraceId>,
        metadata: Metadata,
        timestamp: f64,
    ) -> Self {
        Self {
            role,
            content: Some(content.into()),
            trace_id: trace_id.into(),
            metadata,
            timestamp,
        }
    }

    /// Message body, if present.
    pub fn content_text(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Session the record belongs to, or [`UNKNOWN`] when it carries none.
    ///
    /// Non-string ids are rendered as JSON text, so `5` groups as `"5"`.
    pub fn session_key(&self) -> Cow<'_, str> {
        match self.metadata.get(SESSION_ID_KEY) {
            Some(Value::String(id)) => Cow::Borrowed(id.as_str()),
            Some(other) => Cow::Owned(other.to_string()),
            None => Cow::Borrowed(UNKNOWN),
        }
    }

    /// Timestamp as a UTC datetime, when representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        let micros = (self.timestamp * 1_000_000.0).round();
        if !micros.is_finite() {
            return None;
        }
        DateTime::from_timestamp_micros(micros as i64)
    }
}

/// Mint a fresh trace id (the first characters of a random UUID).
pub fn new_trace_id() -> TraceId {
    let mut id = Uuid::new_v4().to_string();
    id.truncate(TRACE_ID_LEN);
    id
}

/// Mint a fresh session id.
pub fn new_session_id() -> SessionId {
    Uuid::new_v4().to_string()
}

/// Convert a datetime into fractional epoch seconds.
pub fn unix_timestamp(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Non-object metadata in a loaded log is read as an empty map.
fn metadata_or_empty<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Metadata::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Metadata, Role, SESSION_ID_KEY, TRACE_ID_LEN, TurnRecord, UNKNOWN, new_trace_id,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn record_serializes_with_log_keys() {
        let mut metadata = Metadata::new();
        metadata.insert("session_id".to_string(), json!("s1"));
        let record = TurnRecord::new(Role::User, "What is 2+2?", "abc123", metadata, 100.0);
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(
            value,
            json!({
                "role": "user",
                "content": "What is 2+2?",
                "trace_id": "abc123",
                "metadata": { "session_id": "s1" },
                "timestamp": 100.0
            })
        );
    }

    #[test]
    fn record_tolerates_null_content_and_metadata() {
        let record: TurnRecord = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "trace_id": "t",
            "metadata": null,
            "timestamp": 5
        }))
        .expect("deserialize");
        assert_eq!(record.content, None);
        assert_eq!(record.metadata, Metadata::new());
        assert_eq!(record.session_key(), UNKNOWN);
    }

    #[test]
    fn non_string_session_id_keeps_its_value() {
        let mut metadata = Metadata::new();
        metadata.insert(SESSION_ID_KEY.to_string(), json!(5));
        let record = TurnRecord::new(Role::User, "hi", "t", metadata, 1.0);
        assert_eq!(record.session_key(), "5");

        let record = TurnRecord::new(Role::User, "hi", "t", Metadata::new(), 1.0);
        assert_eq!(record.session_key(), UNKNOWN);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "system".parse::<Role>().expect_err("role");
        assert_eq!(err.to_string(), "unknown role: system");
        assert_eq!("assistant".parse::<Role>().expect("role"), Role::Assistant);
    }

    #[test]
    fn trace_ids_are_short() {
        let id = new_trace_id();
        assert_eq!(id.len(), TRACE_ID_LEN);
        assert_ne!(id, new_trace_id());
    }

    #[test]
    fn datetime_matches_timestamp() {
        let record = TurnRecord::new(Role::User, "hi", "t", Metadata::new(), 1_700_000_000.5);
        let at = record.datetime().expect("datetime");
        assert_eq!(at.timestamp(), 1_700_000_000);
        assert_eq!(at.timestamp_subsec_millis(), 500);
    }
}

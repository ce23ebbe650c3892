//! In-memory chat session state.

use aibot_rs_protocol::{Role, SessionId, TraceId, new_session_id};
use serde::Serialize;

/// A message shown in the chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub trace_id: Option<TraceId>,
}

/// One UI session: an id carried in every record's metadata plus the
/// transcript of completed turns.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    id: SessionId,
    history: Vec<HistoryEntry>,
    completed_turns: u32,
}

impl ChatSession {
    /// Start a session with a fresh UUID.
    pub fn new() -> Self {
        Self::with_id(new_session_id())
    }

    pub fn with_id(id: impl Into<SessionId>) -> Self {
        Self {
            id: id.into(),
            history: Vec::new(),
            completed_turns: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// First characters of the id, for display.
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn completed_turns(&self) -> u32 {
        self.completed_turns
    }

    /// 1-based index of the turn about to run.
    pub fn next_turn(&self) -> u32 {
        self.completed_turns + 1
    }

    pub(crate) fn record_turn(&mut self, prompt: &str, response: &str, trace_id: &str) {
        self.history.push(HistoryEntry {
            role: Role::User,
            content: prompt.to_string(),
            trace_id: None,
        });
        self.history.push(HistoryEntry {
            role: Role::Assistant,
            content: response.to_string(),
            trace_id: Some(trace_id.to_string()),
        });
        self.completed_turns += 1;
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ChatSession;
    use aibot_rs_protocol::Role;
    use pretty_assertions::assert_eq;

    #[test]
    fn turns_advance_and_history_alternates() {
        let mut session = ChatSession::with_id("0123456789abcdef");
        assert_eq!(session.short_id(), "01234567");
        assert_eq!(session.next_turn(), 1);

        session.record_turn("hi", "hello", "abcd1234");
        assert_eq!(session.next_turn(), 2);
        let roles: Vec<_> = session.history().iter().map(|entry| entry.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(session.history()[1].trace_id.as_deref(), Some("abcd1234"));
    }

    #[test]
    fn short_id_handles_short_ids() {
        assert_eq!(ChatSession::with_id("abc").short_id(), "abc");
        assert_eq!(ChatSession::new().id().len(), 36);
    }
}

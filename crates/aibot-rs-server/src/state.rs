use aibot_rs_core::{ChatSession, TurnRunner};
use aibot_rs_protocol::SessionId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Live chat sessions keyed by id.
///
/// The table lock only guards lookups; each session has its own async mutex so
/// turns on one session run in order without blocking the others.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<ChatSession>>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh session and return its id.
    pub fn create(&self) -> SessionId {
        let session = ChatSession::new();
        let id = session.id().to_string();
        self.sessions
            .write()
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    pub fn get(&self, id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions.read().get(id).cloned()
    }

    /// Drop a session and its history. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<TurnRunner>,
    pub sessions: Arc<SessionTable>,
    /// Suggested filename for trace downloads.
    pub export_filename: String,
}

impl AppState {
    pub fn new(runner: Arc<TurnRunner>, export_filename: impl Into<String>) -> Self {
        Self {
            runner,
            sessions: Arc::new(SessionTable::new()),
            export_filename: export_filename.into(),
        }
    }
}

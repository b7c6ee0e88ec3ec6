//! Per-browser conversations keyed by a session cookie

use crate::conversation::Conversation;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "travel_chat_session";

/// A session's conversation. The async lock is held for a whole turn cycle,
/// so a session processes one interaction at a time.
pub type SessionHandle = Arc<tokio::sync::Mutex<Conversation>>;

/// A resolved session
pub struct Session {
    pub id: String,
    pub conversation: SessionHandle,
    /// True when the id was minted for this request and must be set as a cookie
    pub is_new: bool,
}

impl Session {
    /// `Set-Cookie` value for a newly created session
    pub fn cookie(&self) -> Option<String> {
        self.is_new
            .then(|| format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id))
    }
}

/// In-memory session registry. Conversations die with the process.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing conversation for `id`, if any. Never creates a session.
    pub fn lookup(&self, id: Option<&str>) -> Option<SessionHandle> {
        let id = id?;
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Look up the caller's session, creating a seeded one for unknown or
    /// missing ids. Client-supplied ids are never adopted. Only actions that
    /// mutate a conversation call this.
    pub fn resolve(&self, id: Option<&str>) -> Session {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(id) = id {
            if let Some(conversation) = sessions.get(id) {
                return Session {
                    id: id.to_string(),
                    conversation: conversation.clone(),
                    is_new: false,
                };
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let conversation: SessionHandle = Arc::default();
        sessions.insert(id.clone(), conversation.clone());
        tracing::info!(session = %id, active_sessions = sessions.len(), "Session started");

        Session {
            id,
            conversation,
            is_new: true,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

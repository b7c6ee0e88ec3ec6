//! HTTP surface for the travel guide chat
//!
//! Server-rendered: `GET /` draws the page, form posts mutate the caller's
//! conversation and redirect back to `/`.

mod assets;
mod handlers;
mod render;
mod session;
mod types;

pub use handlers::create_router;
pub use session::SessionStore;

use crate::chat::ChatEngine;
use std::sync::Arc;

/// Whether the chat can run, decided once at startup
#[derive(Clone)]
pub enum Backend {
    Ready(ChatEngine),
    /// Startup failed; the message is shown on every page
    Halted(String),
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

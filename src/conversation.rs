//! Conversation store
//!
//! An append-only list of turns that always starts with the system seed.
//! Mutation goes through [`Conversation::apply`], which accepts exactly two
//! events: a complete user/assistant exchange, or a reset back to the seed.
//! User and assistant turns therefore always arrive in pairs.

#[cfg(test)]
mod proptests;

use serde::Serialize;

/// Content of the single system turn every conversation starts with
pub const SEED_CONTENT: &str = "You are a helpful assistant.";

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Capitalised label shown next to each turn
    pub fn label(self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn seed() -> Self {
        Self::new(Role::System, SEED_CONTENT)
    }
}

/// Where the conversation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvState {
    /// Only the seed turn is present
    Seeded,
    /// At least one exchange has been recorded
    Accumulating,
}

/// Events that mutate a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A submitted message and the reply it produced
    Exchange { user: String, assistant: String },
    /// Discard everything but the seed
    Reset,
}

/// Ordered turns for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::seed()],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of recorded user/assistant exchanges
    pub fn exchanges(&self) -> usize {
        (self.turns.len() - 1) / 2
    }

    pub fn state(&self) -> ConvState {
        if self.turns.len() == 1 {
            ConvState::Seeded
        } else {
            ConvState::Accumulating
        }
    }

    pub fn apply(&mut self, event: Event) -> ConvState {
        match event {
            Event::Exchange { user, assistant } => {
                self.turns.reserve(2);
                self.turns.push(Turn::new(Role::User, user));
                self.turns.push(Turn::new(Role::Assistant, assistant));
            }
            Event::Reset => {
                self.turns.truncate(1);
                self.turns[0] = Turn::seed();
            }
        }
        self.state()
    }
}

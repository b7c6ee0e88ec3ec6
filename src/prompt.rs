//! Prompt composition
//!
//! Each submission is sent on its own, prefixed with the travel guide
//! persona. Earlier turns are not re-sent, so the model has no memory of
//! the conversation beyond the current message.

/// Persona instruction prepended to every prompt
pub const TRAVEL_GUIDE_PERSONA: &str = "You are a travel guide providing detailed information about various destinations around the world.";

/// Build the prompt for one user message
pub fn compose_prompt(user_text: &str) -> String {
    format!("{TRAVEL_GUIDE_PERSONA} {user_text}")
}

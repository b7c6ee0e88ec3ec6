//! The submission turn cycle
//!
//! compose prompt -> generate -> record both turns. Generation failures never
//! escape this module: they become the assistant's reply text so the page can
//! render them like any other answer.

use crate::conversation::{Conversation, Event};
use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::prompt::compose_prompt;
use std::sync::Arc;

/// Prefix of the assistant text recorded when generation fails
pub const GENERATION_ERROR_PREFIX: &str = "Error generating response:";

/// Outcome of one generation call
#[derive(Debug, Clone)]
pub enum Reply {
    Generated(String),
    Failed(LlmError),
}

impl Reply {
    pub fn is_failure(&self) -> bool {
        matches!(self, Reply::Failed(_))
    }

    /// Text to record as the assistant turn
    pub fn into_content(self) -> String {
        match self {
            Reply::Generated(text) => text,
            Reply::Failed(e) => format!("{GENERATION_ERROR_PREFIX} {e}"),
        }
    }
}

/// What a submission did to the conversation
#[derive(Debug, Clone)]
pub enum Submission {
    /// Empty input; nothing recorded, nothing sent
    Ignored,
    /// Exchange recorded with a generated reply
    Answered,
    /// Exchange recorded with the error text as the reply
    Failed(LlmError),
}

/// Generation client plus the settings applied to each request
#[derive(Clone)]
pub struct ChatEngine {
    service: Arc<dyn LlmService>,
    max_output_tokens: Option<u32>,
}

impl ChatEngine {
    pub fn new(service: Arc<dyn LlmService>, max_output_tokens: Option<u32>) -> Self {
        Self {
            service,
            max_output_tokens,
        }
    }

    pub fn model_id(&self) -> &str {
        self.service.model_id()
    }

    /// One call to the generation service for one user message
    pub async fn generate_reply(&self, user_text: &str) -> Reply {
        let request =
            LlmRequest::new(compose_prompt(user_text)).with_max_tokens(self.max_output_tokens);

        match self.service.complete(&request).await {
            Ok(response) => Reply::Generated(response.text),
            Err(e) => Reply::Failed(e),
        }
    }

    /// Run a full turn cycle against `conversation`.
    ///
    /// Empty input is ignored. Anything else, whitespace included, grows the
    /// conversation by exactly two turns whether or not generation succeeded.
    pub async fn submit(&self, conversation: &mut Conversation, input: &str) -> Submission {
        if input.is_empty() {
            return Submission::Ignored;
        }

        let reply = self.generate_reply(input).await;
        let failed = reply.is_failure();
        let outcome = match &reply {
            Reply::Generated(_) => Submission::Answered,
            Reply::Failed(e) => Submission::Failed(e.clone()),
        };

        conversation.apply(Event::Exchange {
            user: input.to_string(),
            assistant: reply.into_content(),
        });

        tracing::debug!(
            exchanges = conversation.exchanges(),
            failed,
            "Exchange recorded"
        );
        outcome
    }
}

use crate::config::ProviderConfig;
use crate::conversation::{Conversation, Message};
use crate::error::{AssistantError, ProviderError};
use crate::formatter::InstructionFormatter;
use crate::llm::{validate_request, ModelBackend, ResponseGenerator, ResponseMode};
use crate::safety::SafetyChecker;

/// Substituted for disallowed output. Not run back through the filter.
pub const REFUSAL_MESSAGE: &str = "I'm sorry, but I can't assist with that request.";

/// Runs the generate → safety-check → format pipeline for one conversation.
/// Turns are strictly sequential; a front end that allows overlapping turns
/// on the same conversation must serialize them itself.
pub struct Assistant {
    generator: ResponseGenerator,
    safety: SafetyChecker,
    formatter: InstructionFormatter,
}

impl Assistant {
    pub fn new(generator: ResponseGenerator) -> Self {
        Self {
            generator,
            safety: SafetyChecker::default(),
            formatter: InstructionFormatter::default(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(ResponseGenerator::from_config(config)?))
    }

    pub fn with_backend(backend: Box<dyn ModelBackend>) -> Self {
        Self::new(ResponseGenerator::new(backend))
    }

    pub fn provider_name(&self) -> &str {
        self.generator.provider_name()
    }

    /// One turn: append the user message, generate against the prior
    /// history, filter, format, append the assistant message. On a
    /// validation failure the conversation is untouched; on a provider
    /// failure only the user turn remains appended.
    pub async fn respond(
        &self,
        conversation: &mut Conversation,
        query: &str,
        mode: ResponseMode,
    ) -> Result<String, AssistantError> {
        validate_request(query, conversation)?;

        let history = conversation.clone();
        conversation.push(Message::user(query));

        let raw_text = self.generator.generate(query, &history, mode).await?;

        let verdict = self.safety.verdict(&raw_text);
        let reply = if verdict.allowed {
            self.formatter.format(&raw_text)
        } else {
            tracing::warn!(
                pattern = verdict.matched_pattern.as_deref().unwrap_or(""),
                "Generated content blocked; substituting refusal"
            );
            REFUSAL_MESSAGE.to_string()
        };

        conversation.push(Message::assistant(reply.clone()));
        Ok(reply)
    }
}

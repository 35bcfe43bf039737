pub use assistant::{Assistant, REFUSAL_MESSAGE};
pub use config::{ProviderConfig, ProviderKind};
pub use conversation::{Conversation, Message, Role};
pub use error::{AssistantError, ProviderError, ValidationError};
pub use formatter::InstructionFormatter;
pub use llm::{
    GenerationParams, ModelBackend, OllamaBackend, OpenAiBackend, ResponseGenerator, ResponseMode,
};
pub use safety::{SafetyChecker, SafetyVerdict};

pub mod assistant;
pub mod config;
pub mod conversation;
pub mod error;
pub mod formatter;
pub mod llm;
pub mod safety;

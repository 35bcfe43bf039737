use crate::config::{ProviderConfig, ProviderKind};
use crate::conversation::{Conversation, Message};
use crate::error::{AssistantError, ProviderError, ValidationError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONCISE_MAX_TOKENS: u32 = 300;
const DETAILED_MAX_TOKENS: u32 = 1500;
const DEFAULT_TEMPERATURE: f32 = 0.5;
const DEFAULT_TOP_P: f32 = 1.0;
const DEFAULT_FREQUENCY_PENALTY: f32 = 0.0;
const DEFAULT_PRESENCE_PENALTY: f32 = 0.6;

const CONCISE_PREAMBLE: &str = "You are an AI assistant specializing in data science and \
Python programming. Provide clear and concise explanations.";
const DETAILED_PREAMBLE: &str =
    "You are an AI assistant specializing in data science and Python programming.";

const CONCISE_SUFFIX: &str = "Provide a clear and concise explanation of how to accomplish \
the user's request using Python, pandas, and matplotlib. Focus on educating the user without \
delving into excessive detail.";
const DETAILED_SUFFIX: &str = "The user has requested more detailed instructions. Provide an \
even more comprehensive, step-by-step guide on how to accomplish the user's request using \
Python, pandas, and matplotlib. Include additional code snippets, in-depth explanations, best \
practices, and potential pitfalls to watch out for.";

/// Generation preset: instruction wording plus output token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Concise,
    Detailed,
}

impl ResponseMode {
    pub fn max_tokens(self) -> u32 {
        match self {
            ResponseMode::Concise => CONCISE_MAX_TOKENS,
            ResponseMode::Detailed => DETAILED_MAX_TOKENS,
        }
    }

    fn system_preamble(self) -> &'static str {
        match self {
            ResponseMode::Concise => CONCISE_PREAMBLE,
            ResponseMode::Detailed => DETAILED_PREAMBLE,
        }
    }

    fn instruction_suffix(self) -> &'static str {
        match self {
            ResponseMode::Concise => CONCISE_SUFFIX,
            ResponseMode::Detailed => DETAILED_SUFFIX,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Option<Vec<String>>,
}

impl GenerationParams {
    pub fn for_mode(mode: ResponseMode) -> Self {
        Self {
            max_tokens: mode.max_tokens(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            presence_penalty: DEFAULT_PRESENCE_PENALTY,
            stop: None,
        }
    }
}

/// The single capability a provider must offer: turn an ordered message
/// sequence plus sampling parameters into generated text.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, ProviderError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Hosted chat-completions endpoint with bearer auth.
pub struct OpenAiBackend {
    http_client: Client,
    api_key: String,
    org_id: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ProviderError::MissingApiKey(ProviderKind::OpenAi.display_name().to_string())
        })?;

        Ok(Self {
            http_client: build_http_client()?,
            api_key,
            org_id: config.org_id.clone(),
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            model: config.model_name.trim().to_string(),
        })
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn provider_name(&self) -> &str {
        ProviderKind::OpenAi.display_name()
    }

    async fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request_body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
            stop: params.stop.as_deref(),
        };

        let mut request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key);
        if let Some(org_id) = &self.org_id {
            request = request.header("OpenAI-Organization", org_id);
        }

        let response = request
            .json(&request_body)
            .send()
            .await
            .map_err(|e| classify_transport_error(self.provider_name(), e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_transport_error(self.provider_name(), e))?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                provider: self.provider_name().to_string(),
                status: status.as_u16(),
                detail: truncate_error(&text),
            });
        }

        let chat_response: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse {
                provider: self.provider_name().to_string(),
                detail: e.to_string(),
            })?;

        let content = chat_response
            .choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .map(|message| message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ProviderError::EmptyCompletion {
                provider: self.provider_name().to_string(),
            })?;

        Ok(content)
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

/// Local daemon speaking the native generate endpoint. No auth.
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http_client: build_http_client()?,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            model: config.model_name.trim().to_string(),
        })
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn provider_name(&self) -> &str {
        ProviderKind::Ollama.display_name()
    }

    async fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let request_body = OllamaRequest {
            model: &self.model,
            prompt: flatten_messages(messages),
            stream: false,
            options: OllamaOptions {
                num_predict: params.max_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
                frequency_penalty: params.frequency_penalty,
                presence_penalty: params.presence_penalty,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| classify_transport_error(self.provider_name(), e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_transport_error(self.provider_name(), e))?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                provider: self.provider_name().to_string(),
                status: status.as_u16(),
                detail: truncate_error(&text),
            });
        }

        let parsed: OllamaResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse {
                provider: self.provider_name().to_string(),
                detail: e.to_string(),
            })?;

        let content = parsed.response.trim().to_string();
        if content.is_empty() {
            return Err(ProviderError::EmptyCompletion {
                provider: self.provider_name().to_string(),
            });
        }

        Ok(content)
    }
}

/// Builds provider messages and delegates to the backend selected at
/// construction time. The backend is injected, never ambient.
pub struct ResponseGenerator {
    backend: Box<dyn ModelBackend>,
}

impl ResponseGenerator {
    pub fn new(backend: Box<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let backend: Box<dyn ModelBackend> = match config.provider {
            ProviderKind::OpenAi => Box::new(OpenAiBackend::new(config)?),
            ProviderKind::Ollama => Box::new(OllamaBackend::new(config)?),
        };
        Ok(Self::new(backend))
    }

    pub fn provider_name(&self) -> &str {
        self.backend.provider_name()
    }

    pub async fn generate(
        &self,
        query: &str,
        history: &Conversation,
        mode: ResponseMode,
    ) -> Result<String, AssistantError> {
        validate_request(query, history)?;

        let messages = build_messages(query, history, mode);
        let params = GenerationParams::for_mode(mode);

        tracing::debug!(
            provider = self.backend.provider_name(),
            max_tokens = params.max_tokens,
            message_count = messages.len(),
            "Requesting completion"
        );

        let text = self.backend.complete(&messages, &params).await?;
        Ok(text.trim().to_string())
    }
}

/// Checked before any network call; the conversation is never mutated here.
pub fn validate_request(query: &str, history: &Conversation) -> Result<(), ValidationError> {
    if query.trim().is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    history.validate()
}

fn build_messages(query: &str, history: &Conversation, mode: ResponseMode) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(Message::system(mode.system_preamble()));
    messages.extend(history.messages().iter().cloned());
    messages.push(Message::user(query));
    messages.push(Message::user(mode.instruction_suffix()));
    messages
}

fn flatten_messages(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", message.role, message.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(ProviderError::Client)
}

fn classify_transport_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
            seconds: REQUEST_TIMEOUT_SECS,
        }
    } else {
        ProviderError::Transport {
            provider: provider.to_string(),
            source: error,
        }
    }
}

// Upstream error bodies can echo request payloads; clip them before they
// reach logs or error messages. The cut must land on a char boundary or
// slicing a multibyte body would panic.
fn truncate_error(text: &str) -> String {
    const MAX: usize = 320;
    if text.len() <= MAX {
        return text.to_string();
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

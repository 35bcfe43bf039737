use thiserror::Error;

/// Rejected before any network call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Query must be a non-empty string")]
    EmptyQuery,
    #[error("History entry {index} has empty content")]
    BlankHistoryEntry { index: usize },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to initialize HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Missing API key for provider {0}")]
    MissingApiKey(String),
    #[error("Request to {provider} timed out after {seconds}s")]
    Timeout { provider: String, seconds: u64 },
    #[error("Request to {provider} failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned status {status}: {detail}")]
    Api {
        provider: String,
        status: u16,
        detail: String,
    },
    #[error("Failed to parse {provider} response: {detail}")]
    MalformedResponse { provider: String, detail: String },
    #[error("{provider} returned an empty completion")]
    EmptyCompletion { provider: String },
}

/// Everything a turn can fail with. Safety-filter rejections are not errors;
/// they produce a substituted refusal message instead.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

//! Error types shared across the crate

use thiserror::Error;

/// Failures talking to the language-model service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is missing")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode API response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API response contained no text: {0}")]
    EmptyResponse(String),
}

/// Failures talking to the web-search service
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search API returned HTTP {status}")]
    Api { status: u16 },

    #[error("failed to decode search response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key not found (set API_KEY in the environment or .env file)")]
    MissingApiKey,

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Failures that stop a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("LLM Error: {0}")]
    Model(#[from] LlmError),
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

pub type Result<T, E = AssistantError> = std::result::Result<T, E>;

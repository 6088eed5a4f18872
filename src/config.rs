//! Process-wide configuration, loaded once at start-up

use crate::error::ConfigError;
use crate::search::DEFAULT_MAX_RESULTS;
use crate::validation::Blocklist;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub api_key: String,
    pub model_name: String,
    pub offensive_terms: Blocklist,
    pub invalid_locations: Blocklist,
    pub search_max_results: usize,
    pub request_timeout: Duration,
}

impl AssistantConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_name: DEFAULT_MODEL.to_string(),
            offensive_terms: Blocklist::default(),
            invalid_locations: Blocklist::default(),
            search_max_results: DEFAULT_MAX_RESULTS,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    /// Load from the process environment, reading `.env` first if present.
    ///
    /// `API_KEY` is required. `MODEL_NAME`, `OFFENSIVE_TERMS`,
    /// `INVALID_LOCATIONS` (comma-separated), `SEARCH_MAX_RESULTS` and
    /// `LLM_TIMEOUT_SECONDS` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key.trim());

        if let Some(model) = lookup("MODEL_NAME").filter(|m| !m.trim().is_empty()) {
            config.model_name = model.trim().to_string();
        }
        if let Some(terms) = lookup("OFFENSIVE_TERMS") {
            config.offensive_terms = Blocklist::new(split_list(&terms));
        }
        if let Some(places) = lookup("INVALID_LOCATIONS") {
            config.invalid_locations = Blocklist::new(split_list(&places));
        }
        if let Some(raw) = lookup("SEARCH_MAX_RESULTS") {
            config.search_max_results = parse_number("SEARCH_MAX_RESULTS", &raw)?;
        }
        if let Some(raw) = lookup("LLM_TIMEOUT_SECONDS") {
            config.request_timeout =
                Duration::from_secs(parse_number("LLM_TIMEOUT_SECONDS", &raw)? as u64);
        }

        Ok(config)
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_offensive_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.offensive_terms = Blocklist::new(terms);
        self
    }

    pub fn with_invalid_locations<I, S>(mut self, places: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.invalid_locations = Blocklist::new(places);
        self
    }

    pub fn with_search_max_results(mut self, max_results: usize) -> Self {
        self.search_max_results = max_results;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn parse_number(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        })
}

//! Public entry point: screen the request, run the pipeline, project results

use crate::config::AssistantConfig;
use crate::error::Result;
use crate::llm::{GeminiClient, LanguageModel};
use crate::pipeline::IntentPipeline;
use crate::search::{DuckDuckGoClient, WebSearch};
use crate::types::{IntentResult, ProcessedItem};
use crate::validation::{Blocklist, ValidationRules};
use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{info, warn};

/// Reasons a request never reaches the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Please provide a valid input.")]
    Empty,

    #[error("Invalid input type. Please provide a text input.")]
    NotText,

    #[error("I'm sorry, but I can't assist with that request. Please provide a different query.")]
    Offensive,
}

impl Rejection {
    pub fn into_items(self) -> Vec<ProcessedItem> {
        vec![ProcessedItem::error(self.to_string())]
    }
}

pub struct Assistant {
    llm: Box<dyn LanguageModel>,
    search: Box<dyn WebSearch>,
    offensive_terms: Blocklist,
    rules: ValidationRules,
    search_max_results: usize,
}

impl Assistant {
    /// Wire up the Gemini and DuckDuckGo collaborators from configuration
    pub fn from_config(config: AssistantConfig) -> Result<Self> {
        let llm = GeminiClient::from_config(&config)?;
        let search = DuckDuckGoClient::new(config.request_timeout)?;
        info!(model = llm.model(), "assistant ready");
        Ok(Self::with_collaborators(config, llm, search))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(AssistantConfig::from_env()?)
    }

    pub fn with_collaborators<L, S>(config: AssistantConfig, llm: L, search: S) -> Self
    where
        L: LanguageModel + 'static,
        S: WebSearch + 'static,
    {
        Self {
            llm: Box::new(llm),
            search: Box::new(search),
            offensive_terms: config.offensive_terms,
            rules: ValidationRules::new(config.invalid_locations),
            search_max_results: config.search_max_results,
        }
    }

    /// Check a request before any collaborator is involved
    pub fn screen(&self, user_input: &str) -> std::result::Result<(), Rejection> {
        if user_input.trim().is_empty() {
            return Err(Rejection::Empty);
        }
        if let Some(term) = self.offensive_terms.find_match(user_input) {
            warn!(term, "request rejected by content filter");
            return Err(Rejection::Offensive);
        }
        Ok(())
    }

    /// Process a request relative to today's local date
    pub fn process_input(&self, user_input: &str) -> Result<Vec<ProcessedItem>> {
        self.process_input_on(user_input, Local::now().date_naive())
    }

    /// Process a request relative to an explicit reference date
    pub fn process_input_on(
        &self,
        user_input: &str,
        reference_date: NaiveDate,
    ) -> Result<Vec<ProcessedItem>> {
        if let Err(rejection) = self.screen(user_input) {
            return Ok(rejection.into_items());
        }

        let pipeline = IntentPipeline::new(
            self.llm.as_ref(),
            self.search.as_ref(),
            &self.rules,
            self.search_max_results,
        );
        let intents = pipeline.run(user_input, reference_date)?;

        Ok(intents
            .into_iter()
            .map(|intent| ProcessedItem::Intent(IntentResult::from(intent)))
            .collect())
    }
}

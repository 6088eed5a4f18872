//! Assistant core - intent classification and clarification pipeline
//!
//! Classifies a free-text request into one or more intents (dining, travel,
//! gifting, cab booking, other), extracts entities with a language model,
//! normalizes dates, validates the result, generates follow-up questions and
//! runs a web search for anything outside the known categories.

pub mod assistant;
pub mod config;
pub mod dates;
pub mod entities;
pub mod error;
pub mod followup;
pub mod llm;
pub mod pipeline;
pub mod search;
pub mod types;
pub mod validation;

pub use assistant::{Assistant, Rejection};
pub use config::AssistantConfig;
pub use entities::Entities;
pub use error::{AssistantError, ConfigError, LlmError, PipelineError, SearchError};
pub use llm::{GeminiClient, LanguageModel};
pub use search::{DuckDuckGoClient, WebSearch};
pub use types::*;

// Python bindings
#[cfg(feature = "extension-module")]
pub mod py;

#[cfg(feature = "extension-module")]
use pyo3::prelude::*;

#[cfg(feature = "extension-module")]
#[pymodule]
fn assistant_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use py::*;
    m.add_class::<PyAssistant>()?;
    m.add_function(wrap_pyfunction!(py_normalize_date, m)?)?;
    Ok(())
}

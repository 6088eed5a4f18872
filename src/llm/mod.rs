//! Language-model collaborator
//!
//! `LanguageModel` is the raw text-in/text-out service. `IntentModel` sits on
//! top of it and owns everything about prompt wording and reply parsing, so
//! the pipeline only ever sees typed values or a `ModelError`.

pub mod gemini;
pub mod json;
pub mod prompts;

pub use gemini::GeminiClient;

use crate::entities::Entities;
use crate::error::LlmError;
use crate::types::IntentCategory;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Text completion service
pub trait LanguageModel: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

impl<T: LanguageModel + ?Sized> LanguageModel for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).generate(prompt)
    }
}

impl<T: LanguageModel + ?Sized> LanguageModel for std::sync::Arc<T> {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).generate(prompt)
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    /// The service call itself failed
    #[error(transparent)]
    Service(#[from] LlmError),

    /// The service answered, but not with the JSON shape we asked for
    #[error("malformed model reply: {0}")]
    Malformed(String),
}

/// One entry of the classification reply
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedIntent {
    pub category: IntentCategory,
    pub confidence: f64,
    pub conflict: String,
}

/// Extraction reply for one intent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub entities: Entities,
    pub contradictions: Vec<String>,
    pub validation_errors: Vec<String>,
}

/// Default confidence when the model omits one
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Cap on model-suggested follow-up questions
pub const MAX_DYNAMIC_QUESTIONS: usize = 3;

/// Prompted view of a language model
#[derive(Clone, Copy)]
pub struct IntentModel<'a> {
    llm: &'a dyn LanguageModel,
}

impl<'a> IntentModel<'a> {
    pub fn new(llm: &'a dyn LanguageModel) -> Self {
        Self { llm }
    }

    fn ask(&self, prompt: &str) -> Result<Value, ModelError> {
        let reply = self.llm.generate(prompt)?;
        debug!(reply_len = reply.len(), "model replied");
        let body = json::extract_json(&reply);
        serde_json::from_str(body).map_err(|e| ModelError::Malformed(e.to_string()))
    }

    pub fn classify(&self, user_input: &str) -> Result<Vec<ClassifiedIntent>, ModelError> {
        let reply = self.ask(&prompts::classify_intents(user_input))?;

        let items = match reply {
            Value::Array(items) => items,
            obj @ Value::Object(_) => vec![obj],
            other => {
                return Err(ModelError::Malformed(format!(
                    "expected a list of intents, got {other}"
                )))
            }
        };

        let intents = items
            .iter()
            .map(parse_classified)
            .collect::<Result<Vec<_>, _>>()?;

        if intents.is_empty() {
            return Err(ModelError::Malformed("no intents in reply".to_string()));
        }
        Ok(intents)
    }

    pub fn extract(
        &self,
        user_input: &str,
        category: IntentCategory,
    ) -> Result<Extraction, ModelError> {
        let reply = self.ask(&prompts::extract_entities(user_input, category))?;
        let Value::Object(mut obj) = reply else {
            return Err(ModelError::Malformed("expected an extraction object".to_string()));
        };

        let entities = match obj.remove("entities") {
            Some(Value::Object(map)) => map.into_iter().collect(),
            Some(Value::Null) | None => Entities::new(),
            Some(other) => {
                return Err(ModelError::Malformed(format!(
                    "entities must be an object, got {other}"
                )))
            }
        };

        Ok(Extraction {
            entities,
            contradictions: string_list(obj.remove("contradictions")),
            validation_errors: string_list(obj.remove("validation_errors")),
        })
    }

    pub fn suggest_questions(&self, user_input: &str, topic: &str) -> Result<Vec<String>, ModelError> {
        let reply = self.ask(&prompts::follow_up_questions(user_input, topic))?;
        let Value::Array(items) = reply else {
            return Err(ModelError::Malformed("expected a list of questions".to_string()));
        };

        let questions: Vec<String> = items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .take(MAX_DYNAMIC_QUESTIONS)
            .collect();

        if questions.is_empty() {
            return Err(ModelError::Malformed("no questions in reply".to_string()));
        }
        Ok(questions)
    }
}

fn parse_classified(item: &Value) -> Result<ClassifiedIntent, ModelError> {
    let obj = item
        .as_object()
        .ok_or_else(|| ModelError::Malformed(format!("intent entry is not an object: {item}")))?;

    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .map(IntentCategory::from_label)
        .ok_or_else(|| ModelError::Malformed("intent entry has no category".to_string()))?;

    let confidence = match obj.get("confidence") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(DEFAULT_CONFIDENCE),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_CONFIDENCE),
        _ => DEFAULT_CONFIDENCE,
    };

    let conflict = match obj.get("conflict") {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    };

    Ok(ClassifiedIntent {
        category,
        confidence: confidence.clamp(0.0, 1.0),
        conflict,
    })
}

fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;

    #[test]
    fn test_classify_fenced_reply() {
        let llm = ScriptedModel::new([
            "```json\n[{\"category\": \"travel\", \"confidence\": 0.8, \"conflict\": \"Paris or London?\"}, {\"category\": \"Dining\", \"confidence\": 0.6}]\n```",
        ]);
        let intents = IntentModel::new(&llm).classify("fly and dine").unwrap();

        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].category, IntentCategory::Travel);
        assert_eq!(intents[0].conflict, "Paris or London?");
        assert_eq!(intents[1].category, IntentCategory::Dining);
        assert_eq!(intents[1].conflict, "");
    }

    #[test]
    fn test_classify_malformed_reply() {
        let llm = ScriptedModel::new(["I think this is about dinner."]);
        let err = IntentModel::new(&llm).classify("dinner").unwrap_err();
        assert!(matches!(err, ModelError::Malformed(_)));

        let llm = ScriptedModel::new(["[]"]);
        let err = IntentModel::new(&llm).classify("dinner").unwrap_err();
        assert!(matches!(err, ModelError::Malformed(_)));
    }

    #[test]
    fn test_service_failure_is_not_malformed() {
        let llm = ScriptedModel::default();
        llm.push_failure(LlmError::Api {
            status: 503,
            body: "unavailable".into(),
        });
        let err = IntentModel::new(&llm).classify("dinner").unwrap_err();
        assert!(matches!(err, ModelError::Service(LlmError::Api { status: 503, .. })));
    }

    #[test]
    fn test_extract_reply() {
        let llm = ScriptedModel::new([r#"```json
{"entities": {"party_size": 2, "dietary": "gluten-free"}, "contradictions": ["cheap", "luxury"]}
```"#]);
        let extraction = IntentModel::new(&llm)
            .extract("table for two", IntentCategory::Dining)
            .unwrap();

        assert_eq!(extraction.entities.text("party_size").as_deref(), Some("2"));
        assert_eq!(extraction.contradictions, vec!["cheap", "luxury"]);
        assert!(extraction.validation_errors.is_empty());
    }

    #[test]
    fn test_suggest_questions_capped() {
        let llm = ScriptedModel::new([r#"["a?", "b?", "", "c?", "d?"]"#]);
        let questions = IntentModel::new(&llm).suggest_questions("x", "visa").unwrap();
        assert_eq!(questions, vec!["a?", "b?", "c?"]);
        assert!(llm.prompts()[0].contains("Topic: visa"));
    }
}

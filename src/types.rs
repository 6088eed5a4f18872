//! Core data types for pipeline results

use crate::entities::Entities;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Service category of a detected intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    Dining,
    Travel,
    Gifting,
    CabBooking,
    Other,
}

impl IntentCategory {
    pub const ALL: [IntentCategory; 5] = [
        IntentCategory::Dining,
        IntentCategory::Travel,
        IntentCategory::Gifting,
        IntentCategory::CabBooking,
        IntentCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Dining => "dining",
            IntentCategory::Travel => "travel",
            IntentCategory::Gifting => "gifting",
            IntentCategory::CabBooking => "cab_booking",
            IntentCategory::Other => "other",
        }
    }

    /// Lenient label parsing for model output ("Cab Booking", "cab-booking").
    /// Anything unrecognised is treated as `Other`.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .unwrap_or(IntentCategory::Other)
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One web search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// What a web search produced; failures are reported as data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    Results(Vec<SearchResult>),
    Failed { error: String },
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, SearchOutcome::Results(r) if r.is_empty())
    }
}

impl Default for SearchOutcome {
    fn default() -> Self {
        SearchOutcome::Results(Vec::new())
    }
}

/// A detected intent, enriched stage by stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intent {
    pub category: IntentCategory,
    pub confidence: f64,
    pub conflict: String,
    pub key_entities: Entities,
    pub contradictions: Vec<String>,
    pub validation_errors: Vec<String>,
    pub follow_up_questions: Vec<String>,
    pub web_search_results: SearchOutcome,
    /// Date phrase exactly as extracted, before normalization
    #[serde(skip)]
    pub date_phrase: Option<String>,
}

impl Intent {
    pub fn new(category: IntentCategory, confidence: f64) -> Self {
        Self {
            category,
            confidence: confidence.clamp(0.0, 1.0),
            conflict: String::new(),
            key_entities: Entities::new(),
            contradictions: Vec::new(),
            validation_errors: Vec::new(),
            follow_up_questions: Vec::new(),
            web_search_results: SearchOutcome::default(),
            date_phrase: None,
        }
    }

    pub fn with_conflict(mut self, conflict: impl Into<String>) -> Self {
        self.conflict = conflict.into();
        self
    }

    pub fn with_entities(mut self, entities: Entities) -> Self {
        self.key_entities = entities;
        self
    }

    pub fn is_other(&self) -> bool {
        self.category == IntentCategory::Other
    }
}

/// Public projection of a finished intent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentResult {
    pub intent_category: IntentCategory,
    pub key_entities: Entities,
    pub confidence_score: f64,
    pub follow_up_questions: Vec<String>,
    pub web_search_results: SearchOutcome,
    pub validation_errors: Vec<String>,
    pub conflict: String,
}

impl From<Intent> for IntentResult {
    fn from(intent: Intent) -> Self {
        let web_search_results = if intent.is_other() {
            intent.web_search_results
        } else {
            SearchOutcome::default()
        };

        Self {
            intent_category: intent.category,
            key_entities: intent.key_entities,
            confidence_score: intent.confidence,
            follow_up_questions: intent.follow_up_questions,
            web_search_results,
            validation_errors: intent.validation_errors,
            conflict: intent.conflict,
        }
    }
}

/// One element of the list returned by `process_input`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcessedItem {
    Intent(IntentResult),
    Error { error: String },
}

impl ProcessedItem {
    pub fn error(message: impl Into<String>) -> Self {
        ProcessedItem::Error {
            error: message.into(),
        }
    }

    pub fn as_intent(&self) -> Option<&IntentResult> {
        match self {
            ProcessedItem::Intent(result) => Some(result),
            ProcessedItem::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ProcessedItem::Error { error } => Some(error),
            ProcessedItem::Intent(_) => None,
        }
    }
}

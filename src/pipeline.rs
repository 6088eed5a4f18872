//! Intent pipeline state machine
//!
//! `ParseIntent → ExtractEntities → GenerateFollowUps → [HandleNonStandard] → Done`
//!
//! The web-search stage only runs when at least one intent is "other". Each
//! run owns its `PipelineState`; nothing is shared between requests.

use crate::dates::{clean_phrase, parse_date_phrase};
use crate::entities::Entities;
use crate::error::PipelineError;
use crate::followup::FollowUpGenerator;
use crate::llm::{IntentModel, LanguageModel, ModelError, DEFAULT_CONFIDENCE};
use crate::search::{search_outcome, WebSearch};
use crate::types::{Intent, IntentCategory};
use crate::validation::{date_finding, ValidationRules};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

pub const INVALID_LLM_RESPONSE: &str = "Invalid response from LLM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParseIntent,
    ExtractEntities,
    GenerateFollowUps,
    HandleNonStandard,
    Done,
}

/// Working record threaded through the stages
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub request: String,
    pub reference_date: NaiveDate,
    pub intents: Vec<Intent>,
    pub stage: Stage,
}

impl PipelineState {
    pub fn new(request: impl Into<String>, reference_date: NaiveDate) -> Self {
        Self {
            request: request.into(),
            reference_date,
            intents: Vec::new(),
            stage: Stage::ParseIntent,
        }
    }

    pub fn has_non_standard(&self) -> bool {
        self.intents.iter().any(Intent::is_other)
    }
}

pub struct IntentPipeline<'a> {
    model: IntentModel<'a>,
    search: &'a dyn WebSearch,
    rules: &'a ValidationRules,
    follow_ups: FollowUpGenerator,
    search_max_results: usize,
}

impl<'a> IntentPipeline<'a> {
    pub fn new(
        llm: &'a dyn LanguageModel,
        search: &'a dyn WebSearch,
        rules: &'a ValidationRules,
        search_max_results: usize,
    ) -> Self {
        Self {
            model: IntentModel::new(llm),
            search,
            rules,
            follow_ups: FollowUpGenerator::new(),
            search_max_results,
        }
    }

    /// Drive a fresh state to `Done` and hand back the finished intents
    pub fn run(&self, request: &str, reference_date: NaiveDate) -> Result<Vec<Intent>, PipelineError> {
        let mut state = PipelineState::new(request, reference_date);
        while state.stage != Stage::Done {
            state.stage = self.step(&mut state)?;
        }
        info!(intents = state.intents.len(), "pipeline finished");
        Ok(state.intents)
    }

    /// Execute the current stage and return the next one
    pub fn step(&self, state: &mut PipelineState) -> Result<Stage, PipelineError> {
        debug!(stage = ?state.stage, "running pipeline stage");
        let next = match state.stage {
            Stage::ParseIntent => {
                self.parse_intents(state)?;
                Stage::ExtractEntities
            }
            Stage::ExtractEntities => {
                self.extract_entities(state)?;
                Stage::GenerateFollowUps
            }
            Stage::GenerateFollowUps => {
                self.generate_follow_ups(state);
                if state.has_non_standard() {
                    Stage::HandleNonStandard
                } else {
                    Stage::Done
                }
            }
            Stage::HandleNonStandard => {
                self.handle_non_standard(state);
                Stage::Done
            }
            Stage::Done => Stage::Done,
        };
        Ok(next)
    }

    fn parse_intents(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        state.intents = match self.model.classify(&state.request) {
            Ok(classified) => classified
                .into_iter()
                .map(|c| Intent::new(c.category, c.confidence).with_conflict(c.conflict))
                .collect(),
            Err(ModelError::Malformed(reason)) => {
                warn!(%reason, "unparseable intent classification, falling back to 'other'");
                vec![Intent::new(IntentCategory::Other, DEFAULT_CONFIDENCE)]
            }
            Err(ModelError::Service(e)) => return Err(e.into()),
        };

        info!(
            categories = ?state.intents.iter().map(|i| i.category).collect::<Vec<_>>(),
            "intents parsed"
        );
        Ok(())
    }

    fn extract_entities(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        for intent in state.intents.iter_mut() {
            let extraction = match self.model.extract(&state.request, intent.category) {
                Ok(extraction) => extraction,
                Err(ModelError::Malformed(reason)) => {
                    warn!(category = %intent.category, %reason, "unparseable entity extraction");
                    intent.key_entities = Entities::unknown_topic();
                    intent.contradictions.clear();
                    intent.validation_errors = vec![INVALID_LLM_RESPONSE.to_string()];
                    continue;
                }
                Err(ModelError::Service(e)) => return Err(e.into()),
            };

            intent.key_entities = extraction.entities;
            intent.contradictions = extraction.contradictions;
            intent.validation_errors = extraction.validation_errors;

            self.normalize_date(intent, state.reference_date);
            let findings = self.rules.check(&intent.key_entities);
            intent.validation_errors.extend(findings);
        }
        Ok(())
    }

    fn normalize_date(&self, intent: &mut Intent, reference_date: NaiveDate) {
        let Some(raw) = intent.key_entities.text("date") else {
            return;
        };

        let normalized = parse_date_phrase(&raw, reference_date);
        debug!(raw = %raw, normalized = ?normalized, "date normalized");

        if let Some(finding) = date_finding(&raw, normalized) {
            intent.validation_errors.push(finding);
        }
        intent
            .key_entities
            .insert("date", Value::String(normalized.to_entity_string()));
        intent.date_phrase = Some(clean_phrase(&raw));
    }

    fn generate_follow_ups(&self, state: &mut PipelineState) {
        let request = state.request.as_str();
        for intent in state.intents.iter_mut() {
            intent.follow_up_questions = self.follow_ups.generate(intent, request, &self.model);
        }
    }

    /// Search results are kept per intent rather than in one shared slot
    fn handle_non_standard(&self, state: &mut PipelineState) {
        let request = state.request.as_str();
        for intent in state.intents.iter_mut().filter(|i| i.is_other()) {
            intent.web_search_results = search_outcome(self.search, request, self.search_max_results);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::testing::ScriptedModel;
    use crate::search::testing::FakeSearch;
    use crate::types::SearchOutcome;
    use crate::validation::Blocklist;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 22).unwrap()
    }

    fn run(llm: &ScriptedModel, search: &FakeSearch, request: &str) -> Result<Vec<Intent>, PipelineError> {
        let rules = ValidationRules::default();
        IntentPipeline::new(llm, search, &rules, 5).run(request, reference())
    }

    #[test]
    fn test_stage_order_without_other() {
        let llm = ScriptedModel::new([
            r#"[{"category": "travel", "confidence": 0.9}]"#,
            r#"{"entities": {"destination": "Goa", "party_size": 2, "budget": "low", "date": "tomorrow", "time": "6am"}}"#,
        ]);
        let search = FakeSearch::default();
        let rules = ValidationRules::default();
        let pipeline = IntentPipeline::new(&llm, &search, &rules, 5);

        let mut state = PipelineState::new("trip to goa", reference());
        let mut visited = vec![state.stage];
        while state.stage != Stage::Done {
            state.stage = pipeline.step(&mut state).unwrap();
            visited.push(state.stage);
        }

        assert_eq!(
            visited,
            vec![
                Stage::ParseIntent,
                Stage::ExtractEntities,
                Stage::GenerateFollowUps,
                Stage::Done
            ]
        );
        assert!(search.queries().is_empty());

        let intent = &state.intents[0];
        assert_eq!(intent.key_entities.text("date").as_deref(), Some("2025-05-23"));
        assert_eq!(
            intent.follow_up_questions,
            vec!["Could you confirm the specific date and time for your travel?"]
        );
    }

    #[test]
    fn test_malformed_classification_falls_back() {
        let llm = ScriptedModel::new(["Sorry, I can't help with that.", "also not json"]);
        let search = FakeSearch::default();

        let intents = run(&llm, &search, "something odd").unwrap();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].category, IntentCategory::Other);
        assert_eq!(intents[0].confidence, 0.5);
        assert_eq!(intents[0].conflict, "");
        assert_eq!(intents[0].key_entities.text("topic").as_deref(), Some("unknown"));
        assert_eq!(intents[0].validation_errors, vec![INVALID_LLM_RESPONSE]);
    }

    #[test]
    fn test_service_failure_propagates() {
        let llm = ScriptedModel::new([r#"[{"category": "dining", "confidence": 0.9}]"#]);
        llm.push_failure(LlmError::Api {
            status: 500,
            body: "internal".into(),
        });
        let search = FakeSearch::default();

        let err = run(&llm, &search, "dinner").unwrap_err();
        assert!(err.to_string().starts_with("LLM Error:"));
    }

    #[test]
    fn test_date_and_validation_findings_merge() {
        let llm = ScriptedModel::new([
            r#"[{"category": "dining", "confidence": 0.8}]"#,
            r#"{"entities": {"party_size": "150", "date": "May 20 2025", "location": "Narnia"}, "contradictions": [], "validation_errors": ["Location looks fictional"]}"#,
        ]);
        let search = FakeSearch::default();
        let rules = ValidationRules::new(Blocklist::new(["narnia"]));

        let intents = IntentPipeline::new(&llm, &search, &rules, 5)
            .run("party of 150 in narnia", reference())
            .unwrap();
        let intent = &intents[0];

        assert_eq!(intent.key_entities.text("date").as_deref(), Some("invalid_past_date"));
        assert_eq!(
            intent.validation_errors,
            vec![
                "Location looks fictional".to_string(),
                "Requested date is a past date: May 20 2025".to_string(),
                "Party size seems unusually large".to_string(),
                "Invalid location: narnia".to_string(),
            ]
        );
        assert!(intent
            .follow_up_questions
            .contains(&"Could you specify a valid future date for your request?".to_string()));
    }

    #[test]
    fn test_search_results_are_per_intent() {
        let llm = ScriptedModel::new([
            r#"[{"category": "other", "confidence": 0.7}, {"category": "other", "confidence": 0.6}, {"category": "gifting", "confidence": 0.9}]"#,
            r#"{"entities": {"topic": "aadhar address update"}}"#,
            r#"{"entities": {"topic": "hotel", "location": "Goa"}}"#,
            r#"{"entities": {"recipient": "mom", "budget": "100", "occasion": "birthday"}}"#,
        ]);
        let search = FakeSearch::default();

        let intents = run(&llm, &search, "update aadhar, book a hotel and a gift").unwrap();

        assert_eq!(search.queries().len(), 2);
        assert!(search
            .queries()
            .iter()
            .all(|q| q == "update aadhar, book a hotel and a gift"));
        assert!(!intents[0].web_search_results.is_empty());
        assert!(!intents[1].web_search_results.is_empty());
        assert!(intents[2].web_search_results.is_empty());
        assert_eq!(llm.calls(), 4);
    }

    #[test]
    fn test_search_failure_is_data() {
        let llm = ScriptedModel::new([
            r#"[{"category": "other", "confidence": 0.7}]"#,
            r#"{"entities": {"topic": "aadhar"}}"#,
        ]);
        let search = FakeSearch::failing();

        let intents = run(&llm, &search, "aadhar").unwrap();
        assert!(matches!(intents[0].web_search_results, SearchOutcome::Failed { .. }));
    }
}

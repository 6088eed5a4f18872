//! Advisory validation rules
//!
//! Nothing here aborts a request. Findings are plain strings attached to the
//! intent, which the follow-up generator later turns into questions.

use crate::dates::NormalizedDate;
use crate::entities::{value_to_text, Entities, LOCATION_FIELDS};
use serde_json::Value;

pub const MAX_PARTY_SIZE: i64 = 100;

pub const PARTY_SIZE_TOO_LARGE: &str = "Party size seems unusually large";
pub const PARTY_SIZE_INVALID_FORMAT: &str = "Invalid party size format";

/// Case-insensitive substring blocklist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocklist {
    terms: Vec<String>,
}

impl Blocklist {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// First blocked term contained in `text`
    pub fn find_match(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| lowered.contains(term.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.find_match(text).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Check a `party_size` value. Null means "not provided" and yields nothing.
pub fn validate_party_size(value: &Value) -> Option<String> {
    let size = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match size {
        Some(size) if size > MAX_PARTY_SIZE => Some(PARTY_SIZE_TOO_LARGE.to_string()),
        Some(_) => None,
        None => Some(PARTY_SIZE_INVALID_FORMAT.to_string()),
    }
}

/// Finding for a normalized date that needs a different day
pub fn date_finding(raw: &str, normalized: NormalizedDate) -> Option<String> {
    match normalized {
        NormalizedDate::PastDate => Some(format!("Requested date is a past date: {raw}")),
        NormalizedDate::Invalid => Some(format!("Invalid date: {raw}")),
        NormalizedDate::Date(_) | NormalizedDate::AmbiguousNextWeek => None,
    }
}

/// Rules that depend on operator configuration
#[derive(Debug, Clone, Default)]
pub struct ValidationRules {
    invalid_locations: Blocklist,
}

impl ValidationRules {
    pub fn new(invalid_locations: Blocklist) -> Self {
        Self { invalid_locations }
    }

    pub fn check_locations(&self, entities: &Entities) -> Vec<String> {
        LOCATION_FIELDS
            .iter()
            .filter_map(|field| {
                let value = entities.raw(field)?;
                let lowered = value_to_text(value).to_lowercase();
                self.invalid_locations
                    .matches(&lowered)
                    .then(|| format!("Invalid {field}: {lowered}"))
            })
            .collect()
    }

    /// Party size and location findings for one set of entities
    pub fn check(&self, entities: &Entities) -> Vec<String> {
        let mut findings = Vec::new();
        if let Some(finding) = entities.raw("party_size").and_then(validate_party_size) {
            findings.push(finding);
        }
        findings.extend(self.check_locations(entities));
        findings
    }
}

//! Web-search collaborator
//!
//! Only "other" intents reach this. The default backend is the DuckDuckGo
//! Instant Answer API, which needs no key.

use crate::error::SearchError;
use crate::types::{SearchOutcome, SearchResult};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RESULTS: usize = 5;

const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com/";

pub trait WebSearch: Send + Sync {
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError>;
}

impl<T: WebSearch + ?Sized> WebSearch for Box<T> {
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        (**self).search(query, max_results)
    }
}

impl<T: WebSearch + ?Sized> WebSearch for std::sync::Arc<T> {
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        (**self).search(query, max_results)
    }
}

/// Run a search and fold failures into the data value attached to intents
pub fn search_outcome(search: &dyn WebSearch, query: &str, max_results: usize) -> SearchOutcome {
    match search.search(query, max_results) {
        Ok(results) => SearchOutcome::Results(results),
        Err(e) => {
            warn!(error = %e, "web search failed");
            SearchOutcome::Failed {
                error: format!("Search Error: {e}"),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DuckDuckGoClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
    Entry {
        #[serde(rename = "Text", default)]
        text: String,
        #[serde(rename = "FirstURL", default)]
        first_url: String,
    },
}

impl DuckDuckGoClient {
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("assistant-core/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: DUCKDUCKGO_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl WebSearch for DuckDuckGoClient {
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        debug!(query, max_results, "searching DuckDuckGo");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Api {
                status: status.as_u16(),
            });
        }

        // The API answers with a javascript content type, so decode by hand.
        let body = response.text()?;
        let answer: InstantAnswer = serde_json::from_str(&body)?;
        Ok(collect_results(answer, max_results))
    }
}

fn collect_results(answer: InstantAnswer, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if !answer.abstract_url.is_empty() {
        results.push(SearchResult {
            title: answer.heading.clone(),
            url: answer.abstract_url,
            snippet: answer.abstract_text,
        });
    }

    let mut pending: Vec<RelatedTopic> = answer.related_topics.into_iter().rev().collect();
    while let Some(topic) = pending.pop() {
        if results.len() >= max_results {
            break;
        }
        match topic {
            RelatedTopic::Group { topics } => pending.extend(topics.into_iter().rev()),
            RelatedTopic::Entry { text, first_url } => {
                if first_url.is_empty() {
                    continue;
                }
                let title = text
                    .split_once(" - ")
                    .map(|(head, _)| head.to_string())
                    .unwrap_or_else(|| text.clone());
                results.push(SearchResult {
                    title,
                    url: first_url,
                    snippet: text,
                });
            }
        }
    }

    results.truncate(max_results);
    results
}

#[cfg(test)]
pub(crate) mod testing {
    use super::WebSearch;
    use crate::error::SearchError;
    use crate::types::SearchResult;
    use std::sync::Mutex;

    /// Returns fixed results (or a failure) and records queries
    #[derive(Default)]
    pub struct FakeSearch {
        fail: bool,
        queries: Mutex<Vec<String>>,
    }

    impl FakeSearch {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl WebSearch for FakeSearch {
        fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(SearchError::Api { status: 429 });
            }
            Ok((1..=max_results.min(2))
                .map(|i| SearchResult {
                    title: format!("Result {i}"),
                    url: format!("https://example.com/{i}"),
                    snippet: format!("About {query}"),
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeSearch;
    use super::*;

    const SAMPLE: &str = r#"{
        "Heading": "Aadhaar",
        "AbstractText": "Aadhaar is a 12-digit unique identity number.",
        "AbstractURL": "https://en.wikipedia.org/wiki/Aadhaar",
        "RelatedTopics": [
            {"Text": "UIDAI - Unique Identification Authority of India", "FirstURL": "https://duckduckgo.com/UIDAI"},
            {"Name": "See also", "Topics": [
                {"Text": "PAN card - Permanent account number", "FirstURL": "https://duckduckgo.com/PAN"},
                {"Text": "Voter ID", "FirstURL": "https://duckduckgo.com/Voter_ID"}
            ]},
            {"Text": "No link here", "FirstURL": ""}
        ]
    }"#;

    #[test]
    fn test_collect_results_flattens_groups() {
        let answer: InstantAnswer = serde_json::from_str(SAMPLE).unwrap();
        let results = collect_results(answer, 5);

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].title, "Aadhaar");
        assert_eq!(results[1].title, "UIDAI");
        assert_eq!(results[2].url, "https://duckduckgo.com/PAN");
        assert_eq!(results[3].title, "Voter ID");
    }

    #[test]
    fn test_collect_results_respects_limit() {
        let answer: InstantAnswer = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(collect_results(answer, 2).len(), 2);
    }

    #[test]
    fn test_empty_answer() {
        let answer: InstantAnswer = serde_json::from_str("{}").unwrap();
        assert!(collect_results(answer, 5).is_empty());
    }

    #[test]
    fn test_unreachable_endpoint_is_data() {
        let client = DuckDuckGoClient::new(Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://127.0.0.1:1/");

        match search_outcome(&client, "update aadhar", 5) {
            SearchOutcome::Failed { error } => assert!(error.starts_with("Search Error: HTTP request failed")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_failures_become_data() {
        let outcome = search_outcome(&FakeSearch::failing(), "update aadhar", 5);
        match outcome {
            SearchOutcome::Failed { error } => assert!(error.starts_with("Search Error:")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}

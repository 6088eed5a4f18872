//! Clarifying follow-up questions
//!
//! A fixed rule table keyed on intent category and on which entities are
//! missing or suspicious. All applicable rules contribute, in this order:
//! contradictions, conflict, validation findings, the category table, and
//! finally the relative-date confirmation (placed next to the date questions
//! of the categories that have one).
//!
//! The only non-deterministic path is an "other" intent whose topic matches
//! none of the known keywords; those ask the model for questions.

use crate::dates::{is_relative_phrase, AMBIGUOUS_NEXT_WEEK};
use crate::entities::Entities;
use crate::llm::IntentModel;
use crate::types::{Intent, IntentCategory};
use tracing::warn;

pub const GENERIC_DETAILS_QUESTION: &str = "Could you provide more details about your request?";
pub const REGION_QUESTION: &str = "Do you need information for a specific region or state?";

/// Kinds of validation finding that map to a templated question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    OversizedParty,
    BadDate,
    BadLocation,
}

impl IssueKind {
    pub fn classify(finding: &str) -> Option<Self> {
        let lowered = finding.to_lowercase();
        if lowered.contains("party size") && !lowered.contains("format") {
            Some(IssueKind::OversizedParty)
        } else if lowered.contains("invalid date") || lowered.contains("past date") {
            Some(IssueKind::BadDate)
        } else if ["invalid location", "invalid destination", "invalid pickup_location"]
            .iter()
            .any(|p| lowered.contains(p))
        {
            Some(IssueKind::BadLocation)
        } else {
            None
        }
    }

    pub fn question(&self) -> &'static str {
        match self {
            IssueKind::OversizedParty => "Could you confirm the party size? It seems unusually large.",
            IssueKind::BadDate => "Could you specify a valid future date for your request?",
            IssueKind::BadLocation => "Could you specify a real location or destination?",
        }
    }
}

/// Wording for one date → time cascade
struct DateQuestions {
    missing: &'static str,
    which_day: &'static str,
    time: &'static str,
    confirm: &'static str,
}

const DINING_DATES: DateQuestions = DateQuestions {
    missing: "What date would you like to make the reservation for?",
    which_day: "Which day next week would you like to dine?",
    time: "What time would you like to dine?",
    confirm: "Could you confirm the specific date and time for your reservation?",
};

const TRAVEL_DATES: DateQuestions = DateQuestions {
    missing: "When are you planning to travel?",
    which_day: "Which day next week would you like to travel?",
    time: "What time would you like to travel?",
    confirm: "Could you confirm the specific date and time for your travel?",
};

const HOTEL_DATES: DateQuestions = DateQuestions {
    missing: "When are you planning to check in?",
    which_day: "Which day next week would you like to check in?",
    time: "What time will you check in?",
    confirm: "Could you confirm the specific check-in date and time?",
};

const CAB_CONFIRM: &str = "Could you confirm the specific date and time for your cab?";

#[derive(Debug, Clone, Copy, Default)]
pub struct FollowUpGenerator;

impl FollowUpGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, intent: &Intent, request: &str, model: &IntentModel<'_>) -> Vec<String> {
        let mut questions = Questions::default();
        let entities = &intent.key_entities;
        let relative_date = has_relative_date(intent);

        if !intent.contradictions.is_empty() {
            questions.push(format!(
                "Could you clarify your request regarding {}?",
                intent.contradictions.join(", ")
            ));
        }

        if !intent.conflict.trim().is_empty() {
            questions.push(format!("Could you clarify your request? {}", intent.conflict.trim()));
        }

        let mut seen = Vec::new();
        for kind in intent.validation_errors.iter().filter_map(|e| IssueKind::classify(e)) {
            if !seen.contains(&kind) {
                seen.push(kind);
                questions.push(kind.question());
            }
        }

        match intent.category {
            IntentCategory::Dining => dining(entities, relative_date, &mut questions),
            IntentCategory::Travel => travel(entities, relative_date, &mut questions),
            IntentCategory::CabBooking => cab_booking(entities, relative_date, &mut questions),
            IntentCategory::Gifting => gifting(entities, &mut questions),
            IntentCategory::Other => other(entities, relative_date, request, model, &mut questions),
        }

        questions.0
    }
}

#[derive(Default)]
struct Questions(Vec<String>);

impl Questions {
    fn push(&mut self, question: impl Into<String>) {
        self.0.push(question.into());
    }

    fn ask_if_missing(&mut self, entities: &Entities, key: &str, question: &str) {
        if !entities.has(key) {
            self.push(question);
        }
    }

    fn date_cascade(&mut self, entities: &Entities, relative_date: bool, wording: &DateQuestions) {
        match entities.text("date") {
            None => self.push(wording.missing),
            Some(date) if date == AMBIGUOUS_NEXT_WEEK => self.push(wording.which_day),
            Some(_) if !entities.has("time") => self.push(wording.time),
            Some(_) => {}
        }
        if relative_date {
            self.push(wording.confirm);
        }
    }
}

/// The user said "today", "tonight", "tomorrow" or "a week from now"
fn has_relative_date(intent: &Intent) -> bool {
    intent
        .date_phrase
        .as_deref()
        .or_else(|| intent.key_entities.raw("date").and_then(|v| v.as_str()))
        .map(is_relative_phrase)
        .unwrap_or(false)
}

fn dining(e: &Entities, relative_date: bool, q: &mut Questions) {
    q.ask_if_missing(e, "party_size", "How many people are dining?");
    q.ask_if_missing(e, "location", "Could you specify the city or location for the restaurant?");
    q.ask_if_missing(e, "cuisine", "Do you have a preferred cuisine type?");
    q.ask_if_missing(e, "budget", "What is your budget for the meal?");
    q.date_cascade(e, relative_date, &DINING_DATES);
}

fn travel(e: &Entities, relative_date: bool, q: &mut Questions) {
    if !e.has("destination") {
        q.push("Where are you planning to travel?");
    } else {
        let destination = e.lowered("destination");
        let destination = destination.trim();
        if matches!(destination, "airport" | "station") {
            q.push(format!("Which {destination} are you referring to?"));
        }
    }
    q.ask_if_missing(e, "party_size", "How many people are traveling?");
    q.ask_if_missing(e, "budget", "What is your budget for the trip?");
    q.date_cascade(e, relative_date, &TRAVEL_DATES);
}

fn cab_booking(e: &Entities, relative_date: bool, q: &mut Questions) {
    let pickup = e.lowered("pickup_location");
    let destination = e.lowered("destination");
    let (pickup, destination) = (pickup.trim(), destination.trim());
    let same_place = e.has("pickup_location") && e.has("destination") && pickup == destination;

    if !e.has("pickup_location") {
        if destination == "airport" {
            q.push("Which airport are you departing from?");
        } else {
            q.push("What is your pickup location?");
        }
    } else if pickup == "airport" || same_place {
        q.push("Which airport or location are you departing from?");
    }

    if !e.has("destination") {
        q.push("What is your destination?");
    } else if destination == "airport" || same_place {
        q.push("Which airport or location are you going to?");
    }

    if !e.has("time") {
        if e.has("date") {
            q.push("What time do you need the cab?");
        } else {
            q.push("When do you need the cab?");
        }
    }
    if relative_date {
        q.push(CAB_CONFIRM);
    }

    q.ask_if_missing(e, "budget", "Do you have a preferred cab type or budget?");
}

fn gifting(e: &Entities, q: &mut Questions) {
    q.ask_if_missing(e, "budget", "What is your budget for the gift?");
    q.ask_if_missing(e, "occasion", "What is the occasion for the gift?");

    match e.text("recipient") {
        Some(recipient) if !recipient.trim().eq_ignore_ascii_case("unknown") => {
            q.push(format!(
                "What are some interests or preferences of your {}?",
                recipient.trim()
            ));
        }
        Some(_) => {}
        None => q.push("Who is the gift for (e.g., friend, family, colleague)?"),
    }
}

fn other(
    e: &Entities,
    relative_date: bool,
    request: &str,
    model: &IntentModel<'_>,
    q: &mut Questions,
) {
    let topic = e.lowered("topic");

    if topic.contains("hotel") || topic.contains("accommodation") {
        q.ask_if_missing(e, "destination", "Where are you planning to book a hotel?");
        q.ask_if_missing(e, "party_size", "How many people will be staying?");
        q.ask_if_missing(e, "budget", "What is your budget for the hotel?");
        q.date_cascade(e, relative_date, &HOTEL_DATES);
    } else if topic.contains("aadhar") {
        q.push("Do you have your Aadhar number ready?");
        q.push("Are you updating your address online or at a physical center?");
    } else if topic.contains("book") || topic.contains("reading") {
        q.push("What type of book are you looking for (e.g., genre, fiction/non-fiction)?");
        q.push("Are you looking for physical books or e-books?");
        q.ask_if_missing(e, "budget", "What is your budget for the book?");
    } else if topic.contains("dress") || topic.contains("clothing") {
        q.push("What's the occasion for the dress (e.g., casual, formal)?");
        q.push("Do you have a preferred style or color?");
        q.ask_if_missing(e, "budget", "What is your budget for the dress?");
    } else {
        match model.suggest_questions(request, &topic) {
            Ok(suggested) => suggested.into_iter().for_each(|s| q.push(s)),
            Err(e) => {
                warn!(error = %e, "dynamic follow-up generation failed, using generic question");
                q.push(GENERIC_DETAILS_QUESTION);
            }
        }
    }

    q.ask_if_missing(e, "location", REGION_QUESTION);
}

//! Date phrase normalization
//!
//! Maps whatever the model extracted as a `date` ("tonite", "next friday",
//! "23rd February 2025") onto an ISO date relative to a reference day, or onto
//! one of the sentinel flags that ask the user for clarification.

use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

pub const AMBIGUOUS_NEXT_WEEK: &str = "ambiguous_next_week";
pub const INVALID_PAST_DATE: &str = "invalid_past_date";
pub const INVALID_DATE: &str = "invalid_date";

const MISSPELLINGS: &[(&str, &str)] = &[
    ("tonite", "tonight"),
    ("tmrw", "tomorrow"),
    ("tommorow", "tomorrow"),
    ("restraunt", "restaurant"),
    ("itlian", "italian"),
    ("febuary", "february"),
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Accepted absolute formats, tried in order
const DATE_FORMATS: [&str; 10] = [
    "%B %d %Y",  // february 23 2025
    "%d %B %Y",  // 23 february 2025
    "%B %d, %Y", // february 23, 2025
    "%d %B, %Y", // 23 february, 2025
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
];

/// Phrases that resolve to a concrete day but still deserve a confirmation
const RELATIVE_PHRASES: [&str; 4] = ["today", "tonight", "tomorrow", "a week from now"];

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)(st|nd|rd|th)").expect("ordinal pattern is valid"));

/// Outcome of normalizing a date phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedDate {
    Date(NaiveDate),
    AmbiguousNextWeek,
    PastDate,
    Invalid,
}

impl NormalizedDate {
    /// ISO date or sentinel string
    pub fn to_entity_string(&self) -> String {
        match self {
            NormalizedDate::Date(date) => date.format("%Y-%m-%d").to_string(),
            NormalizedDate::AmbiguousNextWeek => AMBIGUOUS_NEXT_WEEK.to_string(),
            NormalizedDate::PastDate => INVALID_PAST_DATE.to_string(),
            NormalizedDate::Invalid => INVALID_DATE.to_string(),
        }
    }
}

/// Lower-case, trim and fix common misspellings
pub fn clean_phrase(raw: &str) -> String {
    let mut phrase = raw.trim().to_lowercase();
    for (misspelled, correct) in MISSPELLINGS {
        if phrase.contains(misspelled) {
            phrase = phrase.replace(misspelled, correct);
        }
    }
    phrase
}

/// Whether the phrase is one of the relative day terms (after clean-up)
pub fn is_relative_phrase(raw: &str) -> bool {
    let phrase = clean_phrase(raw);
    RELATIVE_PHRASES.contains(&phrase.as_str())
}

/// Normalize `raw` against `reference`, returning the entity string form
pub fn normalize_date(raw: &str, reference: NaiveDate) -> String {
    parse_date_phrase(raw, reference).to_entity_string()
}

pub fn parse_date_phrase(raw: &str, reference: NaiveDate) -> NormalizedDate {
    let phrase = clean_phrase(raw);

    match phrase.as_str() {
        "today" | "tonight" => return NormalizedDate::Date(reference),
        "tomorrow" => return offset(reference, 1),
        "a week from now" => return offset(reference, 7),
        "next week" => return NormalizedDate::AmbiguousNextWeek,
        "yesterday" => return NormalizedDate::PastDate,
        _ => {}
    }

    if phrase.contains("next") {
        if let Some(target) = WEEKDAYS
            .iter()
            .position(|day| phrase.contains(&format!("next {day}")))
        {
            let current = reference.weekday().num_days_from_monday() as usize;
            let mut days_ahead = (target + 7 - current) % 7;
            if days_ahead == 0 {
                days_ahead = 7;
            }
            return offset(reference, days_ahead as u64);
        }
    }

    parse_absolute(&phrase, reference)
}

fn parse_absolute(phrase: &str, reference: NaiveDate) -> NormalizedDate {
    let stripped = ORDINAL_SUFFIX.replace_all(phrase, "$1");

    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(&stripped, fmt) {
            // `%Y` also takes short years; only a written four-digit year counts
            if !stripped.contains(&format!("{:04}", parsed.year())) {
                continue;
            }
            if parsed < reference {
                return NormalizedDate::PastDate;
            }
            return NormalizedDate::Date(parsed);
        }
    }

    NormalizedDate::Invalid
}

fn offset(reference: NaiveDate, days: u64) -> NormalizedDate {
    reference
        .checked_add_days(Days::new(days))
        .map(NormalizedDate::Date)
        .unwrap_or(NormalizedDate::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Thursday
    fn reference() -> NaiveDate {
        day(2025, 5, 22)
    }

    #[test]
    fn test_today_and_tonight() {
        assert_eq!(normalize_date("today", reference()), "2025-05-22");
        assert_eq!(normalize_date("  Tonight ", reference()), "2025-05-22");
        assert_eq!(normalize_date("tonite", reference()), "2025-05-22");
    }

    #[test]
    fn test_relative_offsets() {
        assert_eq!(normalize_date("tomorrow", reference()), "2025-05-23");
        assert_eq!(normalize_date("tmrw", reference()), "2025-05-23");
        assert_eq!(normalize_date("a week from now", reference()), "2025-05-29");
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(normalize_date("next week", reference()), AMBIGUOUS_NEXT_WEEK);
        assert_eq!(normalize_date("next week", day(2030, 1, 1)), AMBIGUOUS_NEXT_WEEK);
        assert_eq!(normalize_date("yesterday", reference()), INVALID_PAST_DATE);
        assert_eq!(normalize_date("whenever works", reference()), INVALID_DATE);
        assert_eq!(normalize_date("", reference()), INVALID_DATE);
    }

    #[test]
    fn test_next_weekday_is_strictly_future() {
        let start = day(2025, 5, 19);
        for offset_days in 0..7 {
            let reference = start + chrono::Duration::days(offset_days);
            for name in WEEKDAYS {
                let result = normalize_date(&format!("next {name}"), reference);
                let parsed = NaiveDate::parse_from_str(&result, "%Y-%m-%d").unwrap();
                assert!(parsed > reference, "next {name} from {reference} gave {parsed}");
                assert!(parsed <= reference + chrono::Duration::days(7));
            }
        }
    }

    #[test]
    fn test_next_same_weekday_jumps_a_week() {
        assert_eq!(normalize_date("next thursday", reference()), "2025-05-29");
        assert_eq!(normalize_date("next friday", reference()), "2025-05-23");
        assert_eq!(normalize_date("dinner next monday", reference()), "2025-05-26");
    }

    #[test]
    fn test_absolute_formats() {
        let expected = "2025-06-23";
        for input in [
            "June 23 2025",
            "23 June 2025",
            "June 23, 2025",
            "23 June, 2025",
            "June 23rd 2025",
            "23rd june, 2025",
            "2025-06-23",
            "23-06-2025",
            "06-23-2025",
            "23/06/2025",
            "06/23/2025",
            "2025/06/23",
        ] {
            assert_eq!(normalize_date(input, reference()), expected, "input {input}");
        }
    }

    #[test]
    fn test_day_first_wins_when_ambiguous() {
        assert_eq!(normalize_date("07/08/2025", reference()), "2025-08-07");
    }

    #[test]
    fn test_short_year_is_invalid() {
        assert_eq!(normalize_date("23-06-25", reference()), INVALID_DATE);
        assert_eq!(normalize_date("06/23/25", reference()), INVALID_DATE);
        assert_eq!(normalize_date("June 23 25", reference()), INVALID_DATE);
    }

    #[test]
    fn test_misspelled_month() {
        assert_eq!(normalize_date("febuary 2 2026", reference()), "2026-02-02");
    }

    #[test]
    fn test_past_absolute_date() {
        assert_eq!(normalize_date("May 20 2025", reference()), INVALID_PAST_DATE);
        assert_eq!(normalize_date("May 22 2025", reference()), "2025-05-22");
    }

    #[test]
    fn test_relative_phrase_detection() {
        assert!(is_relative_phrase("Tonite"));
        assert!(is_relative_phrase("a week from now"));
        assert!(!is_relative_phrase("next week"));
        assert!(!is_relative_phrase("2025-06-01"));
    }
}

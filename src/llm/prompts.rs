//! Prompt templates sent to the language model

use crate::entities::ENTITY_VOCABULARY;
use crate::types::IntentCategory;

pub fn classify_intents(user_input: &str) -> String {
    format!(
        r#"Identify the primary intent in the following user input, focusing on the main action (e.g., 'book', 'find', 'suggest'). Possible categories: dining, travel, gifting, cab_booking, other.
Only identify multiple intents if distinct actions are mentioned (e.g., 'book a flight and a dinner'). Any action not related to dining, travel, gifting, or cab_booking (e.g., hotel booking, suggestions like 'suggest a dress' or 'suggest a book', or 'update Aadhar') should be classified as 'other'.
For suggestion requests (e.g., 'suggest a dress', 'suggest a book'), classify as 'other' unless explicitly tied to gift-giving (e.g., 'suggest a gift for my wife'). If the suggestion is for personal use (e.g., 'for me') or unspecified, use 'other'.
If multiple travel intents are mentioned (e.g., 'book a flight to Paris and a flight to London'), flag them as conflicting.
For each intent, provide a confidence score (0.0 to 1.0).
Input: {user_input}
Output format: ```json
[{{"category": "<category>", "confidence": <score>, "conflict": "<optional conflict message>"}}, ...]
```"#
    )
}

pub fn extract_entities(user_input: &str, category: IntentCategory) -> String {
    format!(
        r#"Extract key entities from the following user input for the intent category '{category}'.
Entities to extract (if applicable): {entities}.
Check for contradictions (e.g., 'cheap' and 'luxury') and flag them.
Validate party_size (flag if > 100) and locations (flag if fictional/impossible like 'moon', 'Narnia').
Input: {user_input}
Output format: ```json
{{"entities": {{}}, "contradictions": [], "validation_errors": []}}
```"#,
        entities = ENTITY_VOCABULARY.join(", "),
    )
}

pub fn follow_up_questions(user_input: &str, topic: &str) -> String {
    let topic = if topic.is_empty() { "unknown" } else { topic };
    format!(
        r#"Generate 2-3 relevant follow-up questions for the following user input and topic, tailored to the context.
Input: {user_input}
Topic: {topic}
Output format: ```json
["question 1", "question 2", "question 3"]
```"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_input() {
        let text = "Book a cab to the airport";
        assert!(classify_intents(text).contains("Input: Book a cab to the airport"));

        let extraction = extract_entities(text, IntentCategory::CabBooking);
        assert!(extraction.contains("'cab_booking'"));
        assert!(extraction.contains("pickup_location"));
    }

    #[test]
    fn test_follow_up_prompt_defaults_topic() {
        assert!(follow_up_questions("help", "").contains("Topic: unknown"));
        assert!(follow_up_questions("help", "visa").contains("Topic: visa"));
    }
}

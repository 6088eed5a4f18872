//! Pull the JSON body out of a model reply
//!
//! Replies usually arrive wrapped in a ```json fence, sometimes with prose
//! around it.

/// Strip code fences and surrounding text, returning the JSON candidate
pub fn extract_json(reply: &str) -> &str {
    let trimmed = reply.trim();

    if let Some(start) = trimmed.find("```") {
        // Drop the info string ("json"), which may share a line with the body.
        let body = trimmed[start + 3..].trim_start_matches(|c: char| c.is_ascii_alphabetic());
        let body = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
        return body.trim();
    }

    let first = trimmed.find(['[', '{']);
    let last = trimmed.rfind([']', '}']);
    match (first, last) {
        (Some(start), Some(end)) if end >= start => &trimmed[start..=end],
        _ => trimmed,
    }
}

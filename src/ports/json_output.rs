//! Parsing of JSON-object model output.
//!
//! Models asked for JSON sometimes wrap it in a markdown fence or add a
//! sentence around it; everything outside the outermost braces is ignored.

use serde::de::DeserializeOwned;

/// The outermost `{...}` span of `content`, if any.
pub fn json_object_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Parses the JSON object embedded in model output.
pub fn parse_json_object<T: DeserializeOwned>(content: &str) -> Result<T, String> {
    let span = json_object_span(content).ok_or_else(|| "no JSON object in response".to_string())?;
    serde_json::from_str(span).map_err(|e| format!("Failed to parse AI response: {}", e))
}

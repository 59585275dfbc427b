use serde_json::{Map, Value};
use thiserror::Error;

/// The model produced text, but not a JSON object even after cleanup.
#[derive(Debug, Error)]
#[error("response was not a JSON object: {reason}")]
pub struct FormatError {
    /// The cleaned text that failed to parse.
    pub cleaned: String,
    pub reason: String,
}

/// Turn raw model output into the most likely JSON text.
///
/// Strips markdown fences, slices to the outermost `{ ... }` when present and
/// flattens literal control characters (CR, LF, tab, ...) to spaces. Escaped
/// `\n` sequences inside strings are two characters and survive untouched.
pub fn extract_json_text(raw: &str) -> String {
    let unfenced = raw
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "");

    let sliced = match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if end > start => &unfenced[start..=end],
        _ => unfenced.as_str(),
    };

    sliced.replace(|c: char| c.is_control(), " ").trim().to_string()
}

pub fn parse_analysis(raw: &str) -> Result<Map<String, Value>, FormatError> {
    let cleaned = extract_json_text(raw);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(FormatError {
            reason: format!("expected object, got {}", kind(&other)),
            cleaned,
        }),
        Err(e) => Err(FormatError { reason: e.to_string(), cleaned }),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

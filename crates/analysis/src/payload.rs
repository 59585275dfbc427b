use serde::Serialize;
use serde_json::{json, Map, Value};

/// Keys the front-end reads unconditionally.
pub const EXPECTED_KEYS: [&str; 5] = ["game_name", "definition", "prediction", "hidden_motive", "advice"];

pub const PLACEHOLDER: &str = "(no data)";

const DEGRADED_GAME_NAME: &str = "Analysis unavailable";
const DEGRADED_DEFINITION: &str = "The response could not be read as structured data. The raw text is shown below.";
const RAW_TEXT_LIMIT: usize = 300;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { error: error.into(), detail: Some(detail.into()) }
    }
}

/// Insert [`PLACEHOLDER`] for every expected key the model left out.
pub fn backfill(map: &mut Map<String, Value>) {
    for key in EXPECTED_KEYS {
        if !map.contains_key(key) {
            map.insert(key.to_string(), Value::String(PLACEHOLDER.to_string()));
        }
    }
}

/// Fallback payload for text that would not parse. Still has every expected key.
pub fn degraded(cleaned: &str) -> Value {
    json!({
        "game_name": DEGRADED_GAME_NAME,
        "definition": DEGRADED_DEFINITION,
        "prediction": truncate(cleaned, RAW_TEXT_LIMIT),
        "hidden_motive": PLACEHOLDER,
        "advice": PLACEHOLDER,
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backfill_only_missing() {
        let mut map = Map::new();
        map.insert("game_name".into(), json!("Kick Me"));
        map.insert("extra".into(), json!(1));
        backfill(&mut map);

        assert_eq!(map["game_name"], "Kick Me");
        assert_eq!(map["extra"], 1);
        for key in EXPECTED_KEYS.iter().skip(1) {
            assert_eq!(map[*key], PLACEHOLDER, "key {}", key);
        }
    }

    #[test]
    fn test_backfill_keeps_null_values() {
        let mut map = Map::new();
        map.insert("advice".into(), Value::Null);
        backfill(&mut map);
        assert_eq!(map["advice"], Value::Null);
    }

    #[test]
    fn test_degraded_has_expected_keys() {
        let v = degraded("oops");
        for key in EXPECTED_KEYS {
            assert!(v.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(v["prediction"], "oops");
    }

    #[test]
    fn test_degraded_truncates_on_char_boundary() {
        let long = "あ".repeat(400);
        let v = degraded(&long);
        let prediction = v["prediction"].as_str().unwrap();
        assert_eq!(prediction.chars().count(), RAW_TEXT_LIMIT + 3);
        assert!(prediction.ends_with("..."));
    }

    #[test]
    fn test_error_body_serialization() {
        let body = ErrorBody { error: "Empty input".into(), detail: None };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"error":"Empty input"}"#);

        let body = ErrorBody::new("Safety", "blocked");
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"error": "Safety", "detail": "blocked"}));
    }
}

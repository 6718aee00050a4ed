pub mod job;
pub mod trigger;
pub mod user;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::config::{ApiRoutes, FrontRoutes};
use crate::controller::error::FormError;

/// An in-memory record being created or edited before submission.
///
/// Every buffer has exactly one free-text field whose source of truth is a JSON
/// document (`kwargs` for jobs, `ip_list` for users). The normalizer parses it;
/// everything else comes from `payload_fields`.
pub trait EditBuffer {
    const JSON_FIELD: &'static str;

    fn id(&self) -> Option<String>;
    fn kind(&self) -> String;
    fn json_source(&self) -> &str;

    /// Structural copy of the buffer as it should be submitted, excluding the JSON
    /// field. Never touches `self`.
    fn payload_fields(&self) -> Result<Map<String, Value>, FormError>;

    fn collection_route(routes: &ApiRoutes) -> &str;
    fn item_route(routes: &ApiRoutes) -> &str;
    fn list_view(routes: &FrontRoutes) -> &str;
}

/// Accepts a string, a number or null. Records fetched from the service carry
/// numbers where the form holds strings.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Helper>::deserialize(deserializer)? {
        Some(Helper::Text(s)) => Some(s),
        Some(Helper::Int(i)) => Some(i.to_string()),
        Some(Helper::Float(f)) => Some(f.to_string()),
        None => None,
    })
}

/// The JSON-source fields arrive as text from the form but as parsed JSON from a
/// fetched record; both become source text.
pub(crate) fn json_source<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_string")]
        value: Option<String>,
        #[serde(default, deserialize_with = "json_source")]
        source: String,
    }

    #[test]
    fn lenient_string_accepts_numbers_and_null() {
        let p: Probe = serde_json::from_str(r#"{"value": 3}"#).unwrap();
        assert_eq!(p.value.as_deref(), Some("3"));

        let p: Probe = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(p.value, None);

        let p: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.value, None);
        assert_eq!(p.source, "");
    }

    #[test]
    fn json_source_keeps_text_and_serializes_objects() {
        let p: Probe = serde_json::from_str(r#"{"source": "{bad json"}"#).unwrap();
        assert_eq!(p.source, "{bad json");

        let p: Probe = serde_json::from_str(r#"{"source": {"x": 1}}"#).unwrap();
        assert_eq!(p.source, r#"{"x":1}"#);

        let p: Probe = serde_json::from_str(r#"{"source": ["10.0.0.1"]}"#).unwrap();
        assert_eq!(p.source, r#"["10.0.0.1"]"#);
    }
}

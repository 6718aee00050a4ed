use serde_json::{Map, Value};
use tracing::debug;

use crate::controller::error::FormError;
use crate::form::EditBuffer;

/// A submission-ready body: a structural copy of the edit buffer with its JSON field
/// parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(pub Map<String, Value>);

impl Payload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Builds the payload for `buffer`. The buffer is only borrowed, so a failed parse
/// leaves the caller's state exactly as it was.
pub fn normalize<B: EditBuffer>(buffer: &B) -> Result<Payload, FormError> {
    let mut fields = buffer.payload_fields()?;

    let parsed: Value = serde_json::from_str(buffer.json_source()).map_err(|e| {
        debug!(field = B::JSON_FIELD, error = %e, "JSON field did not parse");
        FormError::Validation(format!("{} is not valid JSON", B::JSON_FIELD))
    })?;
    fields.insert(B::JSON_FIELD.to_string(), parsed);

    Ok(Payload(fields))
}

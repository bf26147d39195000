//! Wire envelope for admin-ajax responses.
//!
//! Every endpoint replies with the WordPress convention
//! `{"success": bool, "data": ...}`. Failure payloads are not uniform
//! across handlers: some put the human-readable text at `data.message`,
//! others send a bare string as `data`. A single decode path collapses
//! both so callers see one `Ok(payload) | Err(message)` shape.

use serde::Deserialize;
use serde_json::Value;

/// Payload key carrying the failure text when `data` is an object.
pub const DATA_MESSAGE_KEY: &str = "message";

/// Fallback when a failure payload carries no usable message.
pub const GENERIC_FAILURE: &str = "request failed";

/// Raw `{success, data}` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct AjaxEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
}

impl AjaxEnvelope {
    /// Collapse the envelope into `Ok(payload)` or `Err(message)`.
    ///
    /// Server messages pass through verbatim; the wording shown to the
    /// user is whatever the handler produced.
    pub fn into_result(self) -> Result<Value, String> {
        if self.success {
            return Ok(self.data);
        }
        Err(failure_message(&self.data))
    }
}

/// Extract the failure text from a `success: false` payload.
fn failure_message(data: &Value) -> String {
    match data {
        Value::String(message) => message.clone(),
        Value::Object(map) => map
            .get(DATA_MESSAGE_KEY)
            .and_then(Value::as_str)
            .unwrap_or(GENERIC_FAILURE)
            .to_owned(),
        _ => GENERIC_FAILURE.to_owned(),
    }
}

#[cfg(test)]
#[path = "envelope_test.rs"]
mod tests;

//! The uniform outcome of a tool call.

use crate::error::{BridgeError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// Either the backend's JSON object passed through verbatim, or `{success: false, error, ..}`.
///
/// A record without an explicit `success: false` is a success; no `success` field is injected
/// into backend bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultRecord(Map<String, Value>);

impl ResultRecord {
    #[must_use]
    pub fn from_backend(body: Map<String, Value>) -> Self {
        Self(body)
    }

    /// Normalise a 2xx response body.
    ///
    /// Objects pass through. A JSON string holding an encoded object is decoded once; any
    /// other value, including a string that does not decode to an object, becomes `{data}`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedResponse`] if the body is not JSON at all.
    pub fn from_body(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| BridgeError::MalformedResponse(e.to_string()))?;
        Ok(match value {
            Value::Object(map) => Self(map),
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => Self(map),
                _ => Self::wrap_data(Value::String(raw)),
            },
            other => Self::wrap_data(other),
        })
    }

    /// Wrap a non-object backend value as `{data: value}`.
    #[must_use]
    pub fn wrap_data(value: Value) -> Self {
        let mut map = Map::new();
        map.insert("data".to_string(), value);
        Self(map)
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("success".to_string(), Value::Bool(false));
        map.insert("error".to_string(), Value::String(error.into()));
        Self(map)
    }

    #[must_use]
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.0.get("success") == Some(&Value::Bool(false))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<BridgeError> for ResultRecord {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::BackendUnreachable { hint } => {
                Self::failure("backend unreachable").with_field("hint", Value::String(hint))
            }
            BridgeError::Translation(e) => Self::failure(format!("invalid arguments: {e}"))
                .with_field("error_type", Value::String("translation".to_string())),
            other => Self::failure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranslationError;
    use serde_json::json;

    #[test]
    fn backend_body_without_success_is_not_a_failure() {
        let record = ResultRecord::from_backend(
            json!({"result": 3}).as_object().cloned().expect("object"),
        );
        assert!(!record.is_failure());
        assert_eq!(record.into_value(), json!({"result": 3}));
    }

    #[test]
    fn backend_reported_failure_is_recognised() {
        let record = ResultRecord::from_backend(
            json!({"success": false, "error": "object 'z' not found"})
                .as_object()
                .cloned()
                .expect("object"),
        );
        assert!(record.is_failure());
    }

    #[test]
    fn unreachable_carries_hint() {
        let record = ResultRecord::from(BridgeError::BackendUnreachable {
            hint: "start it".to_string(),
        });
        assert_eq!(
            record.into_value(),
            json!({"success": false, "error": "backend unreachable", "hint": "start it"})
        );
    }

    #[test]
    fn request_failure_has_exact_shape() {
        let record = ResultRecord::from(BridgeError::BackendRequestFailed {
            status: 500,
            body: "bad formula".to_string(),
        });
        assert_eq!(
            record.into_value(),
            json!({"success": false, "error": "API error: bad formula"})
        );
    }

    #[test]
    fn translation_failure_is_tagged() {
        let record = ResultRecord::from(BridgeError::Translation(
            TranslationError::MissingParameter("x".to_string()),
        ));
        assert!(record.is_failure());
        assert_eq!(record.get("error_type"), Some(&json!("translation")));
    }

    #[test]
    fn body_normalisation() {
        let cases = [
            (r#"{"result": 3}"#, json!({"result": 3})),
            (r#""{\"result\": 3}""#, json!({"result": 3})),
            (r#""plain text""#, json!({"data": "plain text"})),
            (r#""[1, 2]""#, json!({"data": "[1, 2]"})),
            ("42", json!({"data": 42})),
            ("[1.5, 2.5]", json!({"data": [1.5, 2.5]})),
            ("null", json!({"data": null})),
        ];
        for (body, expected) in cases {
            let record = ResultRecord::from_body(body).expect(body);
            assert_eq!(record.into_value(), expected, "body: {body}");
        }
    }

    #[test]
    fn unparsable_body_is_malformed() {
        let err = ResultRecord::from_body("<html>oops</html>").unwrap_err();
        assert!(matches!(err, BridgeError::MalformedResponse(_)));
        let record = ResultRecord::from(err);
        assert!(record.is_failure());
        assert!(
            record
                .get("error")
                .and_then(Value::as_str)
                .is_some_and(|e| e.starts_with("malformed response"))
        );
    }

    #[test]
    fn serializes_as_plain_object() {
        let record = ResultRecord::wrap_data(json!([1, 2]));
        assert_eq!(
            serde_json::to_string(&record).expect("serialize"),
            r#"{"data":[1,2]}"#
        );
    }
}

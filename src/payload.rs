//! Request payloads and normalized verb results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// The structured mapping every capability verb accepts.
///
/// A thin wrapper over a JSON object. Field rules are checked by the receiving backend,
/// so unknown fields are kept and passed through to providers that accept them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Get a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a field as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether a field is present (even if null).
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Mutably borrow the underlying map.
    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Take the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Convert into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Payload {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ValidationError::new(
                "payload",
                format!("payload must be a JSON object, got {other}"),
            )),
        }
    }
}

/// Normalized result of a capability verb.
///
/// Serializes to `{"status": "success", ...fields}` or `{"status": "not_found"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The verb succeeded; fields carry ids, statuses or the provider's response.
    Success(Map<String, Value>),
    /// The identifier does not exist; nothing was mutated.
    NotFound,
}

impl Outcome {
    /// A success with no extra fields.
    pub fn success() -> Self {
        Outcome::Success(Map::new())
    }

    /// A success carrying one field.
    pub fn success_with(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Outcome::success().with(key, value)
    }

    /// A success wrapping a provider response.
    ///
    /// Objects are passed through; any other non-null value is placed under `"response"`.
    pub fn from_response(body: Value) -> Self {
        match body {
            Value::Object(map) => Outcome::Success(map),
            Value::Null => Outcome::success(),
            other => Outcome::success_with("response", other),
        }
    }

    /// Add a field to a success; no-op on `NotFound`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Outcome::Success(fields) = &mut self {
            fields.insert(key.into(), value.into());
        }
        self
    }

    /// The `status` string of the serialized form.
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::NotFound => "not_found",
        }
    }

    /// Whether this is the not-found sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Outcome::NotFound)
    }

    /// Whether the verb succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Get a field of a success.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Outcome::Success(fields) => fields.get(key),
            Outcome::NotFound => None,
        }
    }

    /// Get a string field of a success.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Render as the `{status, ...}` JSON mapping.
    ///
    /// A provider field literally named `status` is kept under `provider_status`.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("status".to_string(), Value::from(self.status()));
        if let Outcome::Success(fields) = self {
            for (key, value) in fields {
                let key = if key == "status" {
                    "provider_status".to_string()
                } else {
                    key.clone()
                };
                out.insert(key, value.clone());
            }
        }
        Value::Object(out)
    }
}

impl Serialize for Outcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

//! Backend-defined user profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InvalidInputError;

/// The profile of the signed-in user, as returned by the backend.
///
/// The shape is owned by the backend. The client only needs an identifier,
/// read from `user_id` (falling back to `id`); everything else is carried
/// through untouched so that a cached profile round-trips exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    /// Wrap a JSON value, which must be an object.
    pub fn new(value: Value) -> Result<Self, InvalidInputError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(InvalidInputError::Json {
                message: format!("user profile must be a JSON object, got {}", other),
            }),
        }
    }

    /// Parse a profile from its persisted JSON text.
    pub fn from_json(json: &str) -> Result<Self, InvalidInputError> {
        let value: Value = serde_json::from_str(json)?;
        Self::new(value)
    }

    /// Serialize the profile to JSON text for persistence.
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// Returns the user identifier, rendered as a string.
    pub fn id(&self) -> Option<String> {
        let raw = self.0.get("user_id").or_else(|| self.0.get("id"))?;
        match raw {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Returns a string attribute such as `email` or `name`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

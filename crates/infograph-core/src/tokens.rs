//! Session token type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidInputError;

/// A backend-issued bearer token for authenticated requests.
///
/// A `SessionToken` is never empty: the absence of a session is modeled as
/// `Option<SessionToken>::None`, not as an empty string.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; it carries no client-side expiry
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Create a new session token.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::EmptyToken`] for empty or
    /// whitespace-only input.
    pub fn new(token: impl Into<String>) -> Result<Self, InvalidInputError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(InvalidInputError::EmptyToken);
        }
        Ok(Self(token))
    }

    /// Returns the token value for use in authorization headers and storage.
    ///
    /// # Security
    ///
    /// Use only when constructing HTTP authorization headers or persisting
    /// the session.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization` header value for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl<'de> Deserialize<'de> for SessionToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SessionToken::new(s).map_err(serde::de::Error::custom)
    }
}

// Hide token value in Debug output
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

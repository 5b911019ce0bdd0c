//! Backend endpoint paths and wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Exchange a Google credential for a session.
pub const GOOGLE_LOGIN: &str = "/api/v1/auth/google";

/// The user behind the bearer token.
pub const CURRENT_USER: &str = "/api/v1/auth/me";

/// End the session on the server.
pub const LOGOUT: &str = "/api/v1/auth/logout";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for [`GOOGLE_LOGIN`].
#[derive(Serialize)]
pub struct GoogleLoginRequest<'a> {
    pub credential: &'a str,
}

/// Error body returned by the backend on non-2xx responses.
///
/// `detail` is usually a string, but validation failures carry a list of
/// objects instead.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorResponse {
    pub(crate) fn into_detail(self) -> Option<String> {
        match self.detail? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_request_shape() {
        let body = serde_json::to_value(GoogleLoginRequest { credential: "abc" }).unwrap();
        assert_eq!(body, json!({"credential": "abc"}));
    }

    #[test]
    fn detail_string_and_list() {
        let plain: ErrorResponse = serde_json::from_value(json!({"detail": "Invalid token"})).unwrap();
        assert_eq!(plain.into_detail().as_deref(), Some("Invalid token"));

        let list: ErrorResponse =
            serde_json::from_value(json!({"detail": [{"msg": "field required"}]})).unwrap();
        assert!(list.into_detail().unwrap().contains("field required"));

        let none: ErrorResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(none.into_detail(), None);
    }
}

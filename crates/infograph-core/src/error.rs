//! Error types for the infograph client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, backend, identity provider, authentication lifecycle, storage,
//! and input validation errors.
//!
//! Every error is `Clone` so that a single coalesced outcome (for example one
//! in-flight hydration awaited by several navigations) can be handed to every
//! waiter.

use std::fmt;
use thiserror::Error;

/// The unified error type for infograph operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, malformed response).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The backend answered with a non-success status.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// The identity provider environment is missing or misconfigured.
    #[error("identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// Authentication lifecycle errors (login, hydration, logout).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Durable key-value storage errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (empty token, bad URL, bad JSON).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if the backend rejected the request as unauthenticated,
    /// looking through authentication lifecycle wrappers.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::Api(api) => api.is_unauthorized(),
            Error::Auth(
                AuthError::CredentialExchange { source }
                | AuthError::Hydration { source }
                | AuthError::LogoutNotification { source },
            ) => source.is_unauthorized(),
            _ => false,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// A non-success response from the backend.
///
/// The backend reports failures as `{"detail": "..."}`; `detail` holds that
/// message when the body had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Error detail from the server.
    pub detail: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self { status, detail }
    }

    /// Check if this is an authentication error.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

/// Identity provider errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Required setup is missing, such as the client identifier.
    #[error("missing identity provider client id")]
    Configuration,

    /// The SDK loaded but did not expose a provider client.
    #[error("identity provider client unavailable after load")]
    ProviderUnavailable,

    /// The SDK script could not be fetched.
    #[error("failed to load identity provider script: {message}")]
    ScriptLoad { message: String },
}

/// Authentication lifecycle errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The backend rejected the provider credential.
    #[error("credential exchange failed: {source}")]
    CredentialExchange { source: Box<Error> },

    /// The stored token is stale or invalid.
    #[error("session hydration failed: {source}")]
    Hydration { source: Box<Error> },

    /// The backend could not be told about a logout.
    #[error("logout notification failed: {source}")]
    LogoutNotification { source: Box<Error> },

    /// A login was requested while another login is in flight. An in-flight
    /// hydration never causes this.
    #[error("another login is in progress")]
    OperationInProgress,

    /// The session changed while this attempt was suspended.
    #[error("session changed before the attempt completed")]
    Superseded,

    /// Every caller dropped the attempt before it completed.
    #[error("authentication attempt was cancelled")]
    Cancelled,
}

impl AuthError {
    pub fn credential_exchange(source: Error) -> Self {
        AuthError::CredentialExchange {
            source: Box::new(source),
        }
    }

    pub fn hydration(source: Error) -> Self {
        AuthError::Hydration {
            source: Box::new(source),
        }
    }

    pub fn logout_notification(source: Error) -> Self {
        AuthError::LogoutNotification {
            source: Box::new(source),
        }
    }
}

/// Storage errors.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// The backing medium holds data that cannot be decoded.
    #[error("corrupt storage: {message}")]
    Corrupt { message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            message: err.to_string(),
        }
    }
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// Empty or whitespace-only session token.
    #[error("session token must not be empty")]
    EmptyToken,

    /// Invalid API base URL.
    #[error("invalid API base URL '{value}': {reason}")]
    ApiBase { value: String, reason: String },

    /// A value is not valid JSON for its expected shape.
    #[error("invalid JSON: {message}")]
    Json { message: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

impl From<serde_json::Error> for InvalidInputError {
    fn from(err: serde_json::Error) -> Self {
        InvalidInputError::Json {
            message: err.to_string(),
        }
    }
}

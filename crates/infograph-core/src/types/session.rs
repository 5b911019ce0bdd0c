//! Session credential, status, and snapshot types.

use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::tokens::SessionToken;

use super::UserProfile;

/// The token and cached profile that make up a client session.
///
/// A present `token` means the client considers itself potentially
/// authenticated. `user` is only meaningful alongside a token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionCredential {
    pub token: Option<SessionToken>,
    pub user: Option<UserProfile>,
}

impl SessionCredential {
    pub fn new(token: Option<SessionToken>, user: Option<UserProfile>) -> Self {
        Self { token, user }
    }

    /// The signed-out credential.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

/// Lifecycle status of the authentication state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    /// No attempt in flight.
    #[default]
    Idle,
    /// A credential exchange or hydration is in flight.
    Loading,
    /// A valid token and user are present.
    Authenticated,
    /// The last attempt failed; the token was cleared.
    Error,
}

impl AuthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStatus::Idle => "idle",
            AuthStatus::Loading => "loading",
            AuthStatus::Authenticated => "authenticated",
            AuthStatus::Error => "error",
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time copy of the authentication state.
#[derive(Debug, Clone, Default)]
pub struct AuthSnapshot {
    pub credential: SessionCredential,
    pub status: AuthStatus,
    pub error: Option<Error>,
}

impl AuthSnapshot {
    pub fn token(&self) -> Option<&SessionToken> {
        self.credential.token.as_ref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.credential.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }
}

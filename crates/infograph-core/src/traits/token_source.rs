//! Read access to the current session for request pipelines and dependent stores.

use crate::SessionToken;

/// Something that knows the current session token.
///
/// Implemented by the authentication state machine; consumed by the request
/// pipeline and by stores that need to know whether a session exists.
pub trait TokenSource: Send + Sync {
    /// Returns the token to attach to the next request, if any.
    fn current_token(&self) -> Option<SessionToken>;

    /// Returns true while a token is held.
    fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }
}

/// A fixed token, for one-off clients and tests.
impl TokenSource for Option<SessionToken> {
    fn current_token(&self) -> Option<SessionToken> {
        self.clone()
    }
}

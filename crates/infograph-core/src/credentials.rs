//! Identity provider credential type.

use std::fmt;

/// An opaque proof of identity issued by the external identity provider.
///
/// A credential is exchanged once with the backend for a [`SessionToken`].
///
/// # Security
///
/// The value is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use infograph_core::ProviderCredential;
///
/// let credential = ProviderCredential::new("eyJhbGciOi...");
/// assert!(!format!("{:?}", credential).contains("eyJ"));
/// ```
///
/// [`SessionToken`]: crate::SessionToken
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredential(String);

impl ProviderCredential {
    /// Wrap a credential string issued by the provider.
    pub fn new(credential: impl Into<String>) -> Self {
        Self(credential.into())
    }

    /// Returns the credential value.
    ///
    /// # Security
    ///
    /// Use this only when constructing the exchange request.
    /// Never log or display this value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderCredential")
            .field(&"[REDACTED]")
            .finish()
    }
}

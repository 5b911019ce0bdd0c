//! Backend trait for the authentication endpoints.

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::UserProfile;
use crate::{ProviderCredential, Result, SessionToken};

/// Response from exchanging a provider credential.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// The backend endpoints the authentication core depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange a provider credential for a session token and user.
    async fn exchange_credential(&self, credential: &ProviderCredential) -> Result<LoginResponse>;

    /// Fetch the user behind a session token.
    async fn current_user(&self, token: &SessionToken) -> Result<UserProfile>;

    /// Tell the backend the session is over.
    async fn logout(&self, token: &SessionToken) -> Result<()>;
}

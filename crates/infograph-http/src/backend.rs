//! HTTP implementation of the authentication endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::IgnoredAny;
use tracing::instrument;

use infograph_core::{
    AuthBackend, ClientConfig, LoginResponse, ProviderCredential, Result, SessionToken,
    UserProfile,
};

use crate::client::ApiClient;
use crate::endpoints::{CURRENT_USER, GOOGLE_LOGIN, GoogleLoginRequest, LOGOUT};

/// [`AuthBackend`] over the backend's `/api/v1/auth` routes.
///
/// Tokens are passed explicitly on each call rather than read from a token
/// source, so hydration can validate a token the machine has not committed
/// to yet.
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    client: ApiClient,
}

impl HttpAuthBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = ApiClient::new(config, Arc::new(None::<SessionToken>))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    #[instrument(skip_all)]
    async fn exchange_credential(&self, credential: &ProviderCredential) -> Result<LoginResponse> {
        let body = GoogleLoginRequest {
            credential: credential.as_str(),
        };
        self.client
            .execute(Method::POST, GOOGLE_LOGIN, Some(&body), None)
            .await
    }

    #[instrument(skip_all)]
    async fn current_user(&self, token: &SessionToken) -> Result<UserProfile> {
        self.client
            .execute::<(), _>(Method::GET, CURRENT_USER, None, Some(token.clone()))
            .await
    }

    #[instrument(skip_all)]
    async fn logout(&self, token: &SessionToken) -> Result<()> {
        self.client
            .execute::<(), IgnoredAny>(Method::POST, LOGOUT, None, Some(token.clone()))
            .await?;
        Ok(())
    }
}

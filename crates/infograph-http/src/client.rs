//! Authenticated request pipeline.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use infograph_core::error::{ApiError, InvalidInputError, TransportError};
use infograph_core::{ApiBase, ClientConfig, Error, Result, SessionToken, TokenSource};

use crate::endpoints::ErrorResponse;

/// HTTP client for the backend API.
///
/// The bearer token is read from the [`TokenSource`] when each request is
/// built, so a login or logout takes effect on the very next request.
/// Failures are returned as-is: there is no retry and no token refresh.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: ApiBase,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    /// Create a client for `config.api_base` with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built (for
    /// example when no TLS backend is available).
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("infograph/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(map_reqwest)?;

        Ok(Self {
            client,
            base: config.api_base.clone(),
            tokens,
        })
    }

    /// Returns the API base this client sends to.
    pub fn base(&self) -> &ApiBase {
        &self.base
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.execute::<(), R>(Method::GET, path, None, self.tokens.current_token())
            .await
    }

    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(body), self.tokens.current_token())
            .await
    }

    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.execute(Method::PUT, path, Some(body), self.tokens.current_token())
            .await
    }

    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.execute::<(), R>(Method::DELETE, path, None, self.tokens.current_token())
            .await
    }

    /// Send an arbitrary method with an optional JSON body and return the
    /// decoded JSON response. An empty response body decodes as `null`.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        self.execute(method, path, body, self.tokens.current_token())
            .await
    }

    /// Send a request with an explicit token, bypassing the token source.
    #[instrument(skip(self, body, token), fields(base = %self.base))]
    pub(crate) async fn execute<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<SessionToken>,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.base.endpoint(path);
        debug!(%method, %url, authenticated = token.is_some(), "API request");

        let mut request = self.client.request(method, &url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, bearer_header(&token)?);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(map_reqwest)?;
        handle_response(response).await
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base)
            .field("authenticated", &self.tokens.is_authenticated())
            .finish()
    }
}

fn bearer_header(token: &SessionToken) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&token.bearer()).map_err(|_| {
        InvalidInputError::Other {
            message: "session token contains characters not allowed in a header".to_string(),
        }
    })?;
    value.set_sensitive(true);
    Ok(value)
}

async fn handle_response<R: DeserializeOwned>(response: Response) -> Result<R> {
    let status = response.status();
    trace!(%status, "API response");

    if !status.is_success() {
        return Err(parse_error_response(response).await.into());
    }

    let bytes = response.bytes().await.map_err(map_reqwest)?;
    let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    serde_json::from_slice(body).map_err(|e| {
        TransportError::Decode {
            message: e.to_string(),
        }
        .into()
    })
}

async fn parse_error_response(response: Response) -> ApiError {
    let status = response.status().as_u16();

    match response.json::<ErrorResponse>().await {
        Ok(body) => ApiError::new(status, body.into_detail()),
        Err(_) => ApiError::new(status, None),
    }
}

/// Classify a reqwest failure into a transport error.
pub(crate) fn map_reqwest(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else if err.is_decode() {
        TransportError::Decode {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}

//! Identity provider SDK traits.
//!
//! These model the two halves of a third-party sign-in SDK: getting the SDK
//! into the process ([`IdentitySdk`]) and talking to the client object it
//! exposes once loaded ([`ProviderClient`]).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{ProviderCredential, Result};

/// Handler invoked with every credential the provider issues.
pub type CredentialCallback = Arc<dyn Fn(ProviderCredential) + Send + Sync>;

/// Settings passed to the provider client on initialization.
#[derive(Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub callback: CredentialCallback,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Appearance of the provider's sign-in button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonOptions {
    pub theme: String,
    pub size: String,
    pub width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Default for ButtonOptions {
    fn default() -> Self {
        Self {
            theme: "outline".to_string(),
            size: "large".to_string(),
            width: 240,
            text: None,
        }
    }
}

/// Loader for the provider SDK.
#[async_trait]
pub trait IdentitySdk: Send + Sync {
    /// Fetch and evaluate the SDK from `src`.
    async fn load_script(&self, src: &str) -> Result<()>;

    /// The client object the SDK exposes, if it is present.
    fn client(&self) -> Option<Arc<dyn ProviderClient>>;
}

/// The provider's client object.
pub trait ProviderClient: Send + Sync {
    fn initialize(&self, config: ProviderConfig);

    /// Render the sign-in button into `target`.
    fn render_button(&self, target: &str, options: &ButtonOptions);

    /// Show the one-tap prompt.
    fn prompt(&self);

    /// Dismiss any pending provider UI.
    fn cancel(&self);
}

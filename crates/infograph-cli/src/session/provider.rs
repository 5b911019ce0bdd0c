//! A terminal stand-in for the identity provider SDK.
//!
//! There is no script to fetch and no button to render in a terminal. The
//! credential is taken from the command line and issued when the provider is
//! prompted.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use infograph_core::traits::{
    ButtonOptions, CredentialCallback, IdentitySdk, ProviderClient, ProviderConfig,
};
use infograph_core::{ProviderCredential, Result};

/// SDK whose only client is a [`ManualProvider`].
#[derive(Clone)]
pub struct ManualSdk {
    provider: Arc<ManualProvider>,
}

impl ManualSdk {
    /// A provider that issues `credential` when prompted.
    pub fn issuing(credential: impl Into<String>) -> Self {
        Self::with_credential(Some(ProviderCredential::new(credential)))
    }

    /// A provider with nothing to issue.
    pub fn silent() -> Self {
        Self::with_credential(None)
    }

    fn with_credential(credential: Option<ProviderCredential>) -> Self {
        Self {
            provider: Arc::new(ManualProvider {
                credential,
                callback: Mutex::new(None),
            }),
        }
    }
}

#[async_trait]
impl IdentitySdk for ManualSdk {
    async fn load_script(&self, src: &str) -> Result<()> {
        debug!(src, "Using command-line credential instead of provider script");
        Ok(())
    }

    fn client(&self) -> Option<Arc<dyn ProviderClient>> {
        let client: Arc<dyn ProviderClient> = self.provider.clone();
        Some(client)
    }
}

/// Provider client that hands over a fixed credential on [`prompt`].
///
/// [`prompt`]: ProviderClient::prompt
pub struct ManualProvider {
    credential: Option<ProviderCredential>,
    callback: Mutex<Option<CredentialCallback>>,
}

impl ProviderClient for ManualProvider {
    fn initialize(&self, config: ProviderConfig) {
        debug!(client_id = %config.client_id, "Provider initialized");
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.callback);
    }

    fn render_button(&self, target: &str, options: &ButtonOptions) {
        debug!(target, ?options, "No button to render in a terminal");
    }

    fn prompt(&self) {
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match (callback, &self.credential) {
            (Some(callback), Some(credential)) => callback(credential.clone()),
            (None, _) => debug!("Prompted before initialization"),
            (_, None) => debug!("No credential to issue"),
        }
    }

    fn cancel(&self) {}
}

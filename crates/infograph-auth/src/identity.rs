//! Bridge to the third-party identity provider SDK.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, info, instrument, warn};

use infograph_core::error::IdentityError;
use infograph_core::traits::{
    ButtonOptions, CredentialCallback, IdentitySdk, ProviderClient, ProviderConfig,
};

/// Lifecycle of the bridge. `Ready` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

type LoadOutcome = Result<Arc<dyn ProviderClient>, IdentityError>;

type LoadFuture = Shared<BoxFuture<'static, LoadOutcome>>;

/// Loads the identity provider SDK once and routes issued credentials to the
/// currently registered handler.
///
/// The load is stored as a shared future the first time [`initialize`] runs
/// with a client id. Concurrent calls await the same attempt, and a call that
/// gives up early leaves the attempt in place for the next one to resume, so
/// the script is fetched at most once.
///
/// [`initialize`]: IdentityBridge::initialize
#[derive(Clone)]
pub struct IdentityBridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    sdk: Arc<dyn IdentitySdk>,
    script_src: String,
    state: RwLock<BridgeState>,
    load: Mutex<Option<LoadFuture>>,
    handler: RwLock<Option<CredentialCallback>>,
}

impl BridgeInner {
    fn set_state(&self, state: BridgeState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

impl IdentityBridge {
    pub fn new(sdk: Arc<dyn IdentitySdk>, script_src: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                sdk,
                script_src: script_src.into(),
                state: RwLock::new(BridgeState::Uninitialized),
                load: Mutex::new(None),
                handler: RwLock::new(None),
            }),
        }
    }

    /// Load and initialize the provider, registering `on_credential`.
    ///
    /// A later call replaces the handler but never reloads the SDK; the
    /// provider stays configured with the first client id.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Configuration`] if `client_id` is missing or blank;
    ///   nothing is loaded.
    /// - [`IdentityError::ScriptLoad`] if the SDK could not be fetched.
    /// - [`IdentityError::ProviderUnavailable`] if the SDK loaded without a
    ///   provider client.
    #[instrument(skip(self, on_credential))]
    pub async fn initialize(
        &self,
        client_id: Option<&str>,
        on_credential: CredentialCallback,
    ) -> Result<(), IdentityError> {
        let Some(client_id) = client_id.map(str::trim).filter(|id| !id.is_empty()) else {
            warn!("No identity provider client id configured");
            return Err(IdentityError::Configuration);
        };

        *self
            .inner
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(on_credential);

        let pending = self
            .inner
            .load
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(|| self.start_load(client_id.to_string()))
            .clone();

        pending.await.map(|_| ())
    }

    fn start_load(&self, client_id: String) -> LoadFuture {
        self.inner.set_state(BridgeState::Initializing);
        info!(src = %self.inner.script_src, "Loading identity provider SDK");

        let sdk = self.inner.sdk.clone();
        let src = self.inner.script_src.clone();
        let bridge = Arc::downgrade(&self.inner);

        async move {
            let outcome = try_load(sdk.as_ref(), &src, client_id, &bridge).await;
            let state = match &outcome {
                Ok(_) => {
                    info!("Identity provider ready");
                    BridgeState::Ready
                }
                Err(e) => {
                    warn!(error = %e, "Identity provider initialization failed");
                    BridgeState::Failed
                }
            };
            if let Some(inner) = bridge.upgrade() {
                inner.set_state(state);
            }
            outcome
        }
        .boxed()
        .shared()
    }

    fn ready_client(&self) -> Option<Arc<dyn ProviderClient>> {
        let load = self.inner.load.lock().unwrap_or_else(PoisonError::into_inner);
        load.as_ref()?.peek()?.as_ref().ok().cloned()
    }

    /// Render the provider's sign-in button into `target`. Does nothing
    /// until the bridge is ready.
    pub fn render_prompt(&self, target: &str, options: &ButtonOptions) {
        match self.ready_client() {
            Some(client) => client.render_button(target, options),
            None => debug!(target, "Identity provider not ready, skipping render"),
        }
    }

    /// Show the provider's one-tap prompt. Does nothing until ready.
    pub fn prompt(&self) {
        if let Some(client) = self.ready_client() {
            client.prompt();
        }
    }

    /// Dismiss any pending provider UI. Safe in every state.
    pub fn cancel(&self) {
        if let Some(client) = self.ready_client() {
            client.cancel();
        }
    }

    pub fn state(&self) -> BridgeState {
        *self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_ready(&self) -> bool {
        self.state() == BridgeState::Ready
    }
}

async fn try_load(
    sdk: &dyn IdentitySdk,
    src: &str,
    client_id: String,
    bridge: &Weak<BridgeInner>,
) -> LoadOutcome {
    sdk.load_script(src)
        .await
        .map_err(|e| IdentityError::ScriptLoad {
            message: e.to_string(),
        })?;

    let client = sdk.client().ok_or(IdentityError::ProviderUnavailable)?;

    client.initialize(ProviderConfig {
        client_id,
        callback: dispatcher(bridge.clone()),
    });

    Ok(client)
}

/// The callback handed to the provider; forwards to the current handler.
fn dispatcher(bridge: Weak<BridgeInner>) -> CredentialCallback {
    Arc::new(move |credential| {
        let Some(inner) = bridge.upgrade() else {
            return;
        };
        let handler = inner
            .handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => handler(credential),
            None => debug!("Credential issued with no handler registered"),
        }
    })
}

impl fmt::Debug for IdentityBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityBridge")
            .field("script_src", &self.inner.script_src)
            .field("state", &self.state())
            .finish()
    }
}

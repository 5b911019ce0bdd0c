//! The application-wide authentication context.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use infograph_core::error::IdentityError;
use infograph_core::traits::{AuthBackend, CredentialCallback, IdentitySdk, KeyValueStore};
use infograph_core::{ClientConfig, Result, UserProfile};

use crate::guard::{RouteGuard, RouteTable};
use crate::identity::IdentityBridge;
use crate::machine::AuthMachine;
use crate::token_store::TokenStore;

/// Outcomes of logins triggered by the identity provider.
pub type LoginEvents = mpsc::UnboundedReceiver<Result<UserProfile>>;

/// Everything the UI layer needs for authentication, built once at startup
/// and passed to whoever needs it.
#[derive(Debug, Clone)]
pub struct AuthContext {
    config: ClientConfig,
    machine: AuthMachine,
    guard: RouteGuard,
    identity: IdentityBridge,
}

impl AuthContext {
    /// Restore the session from `storage` and wire up the guard and bridge
    /// with the default route table.
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn AuthBackend>,
        storage: Arc<dyn KeyValueStore>,
        sdk: Arc<dyn IdentitySdk>,
    ) -> Self {
        let machine = AuthMachine::new(backend, TokenStore::new(storage));
        let guard = RouteGuard::new(machine.clone(), RouteTable::default());
        let identity = IdentityBridge::new(sdk, config.identity_script_src.clone());

        Self {
            config,
            machine,
            guard,
            identity,
        }
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.guard = RouteGuard::new(self.machine.clone(), routes);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn machine(&self) -> &AuthMachine {
        &self.machine
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn identity(&self) -> &IdentityBridge {
        &self.identity
    }

    /// Initialize the identity provider so that every credential it issues
    /// is exchanged through the state machine.
    ///
    /// Each exchange runs as its own task; its outcome is delivered on the
    /// returned channel. Calling this again replaces the previous channel.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn connect_identity(&self) -> std::result::Result<LoginEvents, IdentityError> {
        let handle = Handle::current();
        let machine = self.machine.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        let on_credential: CredentialCallback = Arc::new(move |credential| {
            let machine = machine.clone();
            let tx = tx.clone();
            handle.spawn(async move {
                let outcome = machine.login_with_credential(&credential).await;
                if tx.send(outcome).is_err() {
                    debug!("Login outcome dropped, no listener");
                }
            });
        });

        self.identity
            .initialize(self.config.google_client_id.as_deref(), on_credential)
            .await?;

        Ok(rx)
    }
}

//! The authentication state machine.
//!
//! [`AuthMachine`] is the single owner of the in-memory session credential,
//! the lifecycle [`AuthStatus`], and the last error. Callers trigger
//! transitions through its actions and read it through snapshots; they never
//! set the status directly.
//!
//! State is kept behind a lock that is never held across an `.await`. The
//! only suspension points are backend calls. Every credential change advances
//! an epoch; an attempt that resumes under a different epoch discards its
//! result, so a logout can never be undone by a response that arrives late.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use infograph_core::error::{AuthError, Error};
use infograph_core::traits::{AuthBackend, TokenSource};
use infograph_core::{
    AuthSnapshot, AuthStatus, ProviderCredential, Result, SessionCredential, SessionToken,
    UserProfile,
};

use crate::token_store::TokenStore;

/// Callback invoked with every new snapshot.
pub type AuthListener = Arc<dyn Fn(&AuthSnapshot) + Send + Sync>;

type HydrationFuture = Shared<BoxFuture<'static, Result<Option<UserProfile>>>>;

/// Owns the session credential and drives login, hydration, and logout.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AuthMachine {
    inner: Arc<MachineInner>,
}

struct MachineInner {
    backend: Arc<dyn AuthBackend>,
    store: TokenStore,
    state: RwLock<MachineState>,
    changes: watch::Sender<AuthSnapshot>,
    listeners: RwLock<Vec<AuthListener>>,
}

struct MachineState {
    credential: SessionCredential,
    status: AuthStatus,
    error: Option<Error>,
    epoch: u64,
    /// Epoch the in-flight login started under.
    login: Option<u64>,
    hydration: Option<HydrationFuture>,
    /// Callers currently awaiting `hydration`.
    hydration_waiters: usize,
}

impl MachineState {
    fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            credential: self.credential.clone(),
            status: self.status,
            error: self.error.clone(),
        }
    }

    /// Status implied by the credential alone.
    fn resting_status(&self) -> AuthStatus {
        if self.credential.token.is_some() && self.credential.user.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Idle
        }
    }
}

impl AuthMachine {
    /// Create the machine, restoring the session from `store`.
    ///
    /// A stored token with a cached user starts `Authenticated`; a token
    /// alone starts `Idle` until [`hydrate`](Self::hydrate) runs.
    pub fn new(backend: Arc<dyn AuthBackend>, store: TokenStore) -> Self {
        let mut credential = store.load();
        if credential.token.is_none() && credential.user.take().is_some() {
            debug!("Dropping cached user without a session token");
        }

        let mut state = MachineState {
            credential,
            status: AuthStatus::Idle,
            error: None,
            epoch: 0,
            login: None,
            hydration: None,
            hydration_waiters: 0,
        };
        state.status = state.resting_status();

        info!(
            status = %state.status,
            has_token = state.credential.has_token(),
            "Restored session from storage"
        );

        let (changes, _) = watch::channel(state.snapshot());

        Self {
            inner: Arc::new(MachineInner {
                backend,
                store,
                state: RwLock::new(state),
                changes,
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Exchange a provider credential for a session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::OperationInProgress`] while another login is in flight.
    ///   An in-flight hydration does not block a login; it is superseded.
    /// - [`AuthError::CredentialExchange`] if the backend rejects the
    ///   credential or returns an empty token; the session is cleared and
    ///   the status becomes `Error`.
    /// - [`AuthError::Superseded`] if the session changed (for example, a
    ///   logout) before the backend answered.
    #[instrument(skip(self, credential))]
    pub async fn login_with_credential(
        &self,
        credential: &ProviderCredential,
    ) -> Result<UserProfile> {
        let epoch = {
            let mut state = self.write();
            if state.login.is_some() {
                warn!("Login requested while another attempt is in flight");
                return Err(AuthError::OperationInProgress.into());
            }
            if state.hydration.take().is_some() {
                debug!("Login supersedes in-flight hydration");
                state.epoch += 1;
                state.hydration_waiters = 0;
            }
            state.login = Some(state.epoch);
            state.status = AuthStatus::Loading;
            state.error = None;
            state.epoch
        };
        self.publish();

        info!("Exchanging provider credential");
        let mut guard = AttemptGuard::new(self, epoch);
        let outcome = self
            .inner
            .backend
            .exchange_credential(credential)
            .await
            .and_then(|response| {
                let token = SessionToken::new(response.token)?;
                Ok((token, response.user))
            });
        guard.disarm();

        let result = {
            let mut state = self.write();
            if state.login == Some(epoch) {
                state.login = None;
            }
            if state.epoch != epoch {
                debug!("Session changed during login, discarding result");
                return Err(AuthError::Superseded.into());
            }

            match outcome {
                Ok((token, user)) => {
                    self.apply_credential(
                        &mut state,
                        SessionCredential::new(Some(token), Some(user.clone())),
                    );
                    state.status = AuthStatus::Authenticated;
                    info!(user_id = ?user.id(), "Login succeeded");
                    Ok(user)
                }
                Err(e) => {
                    let err = Error::from(AuthError::credential_exchange(e));
                    self.apply_credential(&mut state, SessionCredential::empty());
                    state.status = AuthStatus::Error;
                    state.error = Some(err.clone());
                    warn!(error = %err, "Login failed");
                    Err(err)
                }
            }
        };

        self.publish();
        result
    }

    /// Validate the stored token against the backend and refresh the user.
    ///
    /// Returns `Ok(None)` without network I/O when there is no token. A call
    /// made while a hydration is in flight joins it and gets the same
    /// outcome; a call made while a login is in flight returns the currently
    /// loaded user.
    ///
    /// If every caller awaiting a hydration drops its future (for example on
    /// a caller-side timeout), the attempt is abandoned: the session is
    /// cleared and the status becomes `Error` with [`AuthError::Cancelled`].
    ///
    /// # Errors
    ///
    /// [`AuthError::Hydration`] if the token is rejected or the backend is
    /// unreachable. The session is cleared and the status becomes `Error`.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> Result<Option<UserProfile>> {
        let (pending, started, epoch) = {
            let mut state = self.write();
            if let Some(pending) = &state.hydration {
                debug!("Joining in-flight hydration");
                let pending = pending.clone();
                state.hydration_waiters += 1;
                (pending, false, state.epoch)
            } else {
                let Some(token) = state.credential.token.clone() else {
                    return Ok(None);
                };
                if state.login.is_some() {
                    debug!("Login in flight, skipping hydration");
                    return Ok(state.credential.user.clone());
                }

                state.status = AuthStatus::Loading;
                state.error = None;
                let pending = self.start_hydration(token, state.epoch);
                state.hydration = Some(pending.clone());
                state.hydration_waiters = 1;
                (pending, true, state.epoch)
            }
        };

        if started {
            self.publish();
        }

        let mut waiter = HydrationWaiter::new(self, epoch);
        let outcome = pending.await;
        waiter.disarm();
        outcome
    }

    fn start_hydration(&self, token: SessionToken, epoch: u64) -> HydrationFuture {
        let backend = self.inner.backend.clone();
        let machine = Arc::downgrade(&self.inner);

        async move {
            info!("Validating stored session");
            let outcome = backend.current_user(&token).await;
            match machine.upgrade() {
                Some(inner) => AuthMachine { inner }.finish_hydration(epoch, outcome),
                None => outcome.map(Some),
            }
        }
        .boxed()
        .shared()
    }

    fn finish_hydration(
        &self,
        epoch: u64,
        outcome: Result<UserProfile>,
    ) -> Result<Option<UserProfile>> {
        let result = {
            let mut state = self.write();
            if state.epoch != epoch {
                debug!("Session changed during hydration, discarding result");
                return Ok(None);
            }
            state.hydration = None;

            match outcome {
                Ok(user) => {
                    let token = state.credential.token.clone();
                    self.apply_credential(
                        &mut state,
                        SessionCredential::new(token, Some(user.clone())),
                    );
                    state.status = AuthStatus::Authenticated;
                    info!(user_id = ?user.id(), "Session restored");
                    Ok(Some(user))
                }
                Err(e) => {
                    let err = Error::from(AuthError::hydration(e));
                    self.apply_credential(&mut state, SessionCredential::empty());
                    state.status = AuthStatus::Error;
                    state.error = Some(err.clone());
                    info!(error = %err, "Stored session rejected, signing out");
                    Err(err)
                }
            }
        };

        self.publish();
        result
    }

    /// End the session.
    ///
    /// The local session is cleared first and always; the backend is then
    /// notified on a best-effort basis. A notification failure is logged and
    /// never returned.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let token = {
            let mut state = self.write();
            let token = state.credential.token.clone();
            self.apply_credential(&mut state, SessionCredential::empty());
            state.status = AuthStatus::Idle;
            token
        };
        self.publish();
        info!("Signed out");

        let Some(token) = token else {
            debug!("No session token, skipping backend logout");
            return;
        };

        if let Err(e) = self.inner.backend.logout(&token).await {
            let err = AuthError::logout_notification(e);
            warn!(error = %err, "Logout request failed");
        }
    }

    /// Replace the session credential and persist it.
    ///
    /// Clears the last error. The status is left alone unless an attempt was
    /// in flight, in which case that attempt is superseded and the status
    /// settles on what the new credential implies.
    pub fn set_credential(&self, credential: SessionCredential) {
        {
            let mut state = self.write();
            self.apply_credential(&mut state, credential);
            if state.status == AuthStatus::Loading {
                state.status = state.resting_status();
            }
        }
        self.publish();
    }

    /// Memory first, then storage, both under the state lock so the store
    /// sees writes in the same order readers do.
    fn apply_credential(&self, state: &mut MachineState, mut credential: SessionCredential) {
        if credential.token.is_none() {
            credential.user = None;
        }

        state.credential = credential;
        state.error = None;
        state.epoch += 1;
        state.login = None;
        state.hydration = None;
        state.hydration_waiters = 0;

        if let Err(e) = self.inner.store.save(&state.credential) {
            error!(error = %e, "Failed to persist session");
        }
    }

    // ========================================================================
    // Readers
    // ========================================================================

    pub fn snapshot(&self) -> AuthSnapshot {
        self.read().snapshot()
    }

    pub fn status(&self) -> AuthStatus {
        self.read().status
    }

    pub fn current_token(&self) -> Option<SessionToken> {
        self.read().credential.token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().credential.user.clone()
    }

    pub fn last_error(&self) -> Option<Error> {
        self.read().error.clone()
    }

    /// True while a token is held, whether or not it has been validated.
    pub fn is_authenticated(&self) -> bool {
        self.read().credential.token.is_some()
    }

    /// True when a token is held but no user has been loaded for it.
    pub fn needs_hydration(&self) -> bool {
        let state = self.read();
        state.credential.token.is_some() && state.credential.user.is_none()
    }

    // ========================================================================
    // Change notification
    // ========================================================================

    /// Watch the state; the receiver always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.changes.subscribe()
    }

    /// Register a callback run after every transition.
    ///
    /// Dependent stores use this to drop their own data on logout.
    pub fn on_auth_change<F>(&self, listener: F)
    where
        F: Fn(&AuthSnapshot) + Send + Sync + 'static,
    {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.inner.changes.send_replace(snapshot.clone());

        let listeners = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            listener(&snapshot);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MachineState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MachineState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenSource for AuthMachine {
    fn current_token(&self) -> Option<SessionToken> {
        AuthMachine::current_token(self)
    }

    fn is_authenticated(&self) -> bool {
        AuthMachine::is_authenticated(self)
    }
}

impl fmt::Debug for AuthMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("AuthMachine")
            .field("status", &state.status)
            .field("has_token", &state.credential.has_token())
            .field(
                "user_id",
                &state.credential.user.as_ref().and_then(UserProfile::id),
            )
            .finish()
    }
}

/// Moves a login that was dropped mid-flight out of `Loading`.
struct AttemptGuard<'a> {
    machine: &'a AuthMachine,
    epoch: u64,
    armed: bool,
}

impl<'a> AttemptGuard<'a> {
    fn new(machine: &'a AuthMachine, epoch: u64) -> Self {
        Self {
            machine,
            epoch,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let changed = {
            let mut state = self.machine.write();
            if state.login == Some(self.epoch) {
                state.login = None;
                state.status = AuthStatus::Error;
                state.error = Some(AuthError::Cancelled.into());
                true
            } else {
                false
            }
        };

        if changed {
            warn!("Login dropped before completion");
            self.machine.publish();
        }
    }
}

/// Tracks one caller awaiting a hydration; abandons the hydration when the
/// last caller drops out before it finishes.
struct HydrationWaiter<'a> {
    machine: &'a AuthMachine,
    epoch: u64,
    armed: bool,
}

impl<'a> HydrationWaiter<'a> {
    fn new(machine: &'a AuthMachine, epoch: u64) -> Self {
        Self {
            machine,
            epoch,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for HydrationWaiter<'_> {
    fn drop(&mut self) {
        let abandoned = {
            let mut state = self.machine.write();
            if state.epoch != self.epoch || state.hydration.is_none() {
                return;
            }
            state.hydration_waiters = state.hydration_waiters.saturating_sub(1);
            if !self.armed || state.hydration_waiters > 0 {
                return;
            }

            self.machine
                .apply_credential(&mut state, SessionCredential::empty());
            state.status = AuthStatus::Error;
            state.error = Some(AuthError::Cancelled.into());
            true
        };

        if abandoned {
            warn!("Hydration abandoned by every caller, signing out");
            self.machine.publish();
        }
    }
}

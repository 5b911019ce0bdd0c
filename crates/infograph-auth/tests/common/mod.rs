//! Shared fakes for the authentication flow tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use infograph_auth::{AuthMachine, TokenStore};
use infograph_core::error::{ApiError, Error, TransportError};
use infograph_core::{
    AuthBackend, LoginResponse, MemoryStore, ProviderCredential, Result, SessionToken, UserProfile,
};

pub fn user(value: Value) -> UserProfile {
    UserProfile::new(value).unwrap()
}

pub fn unauthorized(detail: &str) -> Error {
    Error::Api(ApiError::new(401, Some(detail.to_string())))
}

pub fn offline() -> Error {
    Error::Transport(TransportError::Connection {
        message: "connection refused".to_string(),
    })
}

/// A scripted backend that counts calls and can hold responses until
/// released.
pub struct FakeBackend {
    pub login_outcome: Mutex<Result<LoginResponse>>,
    pub me_outcome: Mutex<Result<UserProfile>>,
    pub logout_fails: AtomicBool,
    pub login_gate: Option<Arc<Notify>>,
    pub me_gate: Option<Arc<Notify>>,
    pub login_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub credentials_seen: Mutex<Vec<String>>,
    pub tokens_seen: Mutex<Vec<String>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            login_outcome: Mutex::new(Ok(LoginResponse {
                token: "t1".to_string(),
                user: user(json!({"id": 1})),
            })),
            me_outcome: Mutex::new(Ok(user(json!({"id": 1})))),
            logout_fails: AtomicBool::new(false),
            login_gate: None,
            me_gate: None,
            login_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            credentials_seen: Mutex::new(Vec::new()),
            tokens_seen: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBackend {
    pub fn with_login(self, outcome: Result<LoginResponse>) -> Self {
        *self.login_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_me(self, outcome: Result<UserProfile>) -> Self {
        *self.me_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_failing_logout(self) -> Self {
        self.logout_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_login_gate(mut self, gate: Arc<Notify>) -> Self {
        self.login_gate = Some(gate);
        self
    }

    pub fn with_me_gate(mut self, gate: Arc<Notify>) -> Self {
        self.me_gate = Some(gate);
        self
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn exchange_credential(&self, credential: &ProviderCredential) -> Result<LoginResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.credentials_seen
            .lock()
            .unwrap()
            .push(credential.as_str().to_string());
        if let Some(gate) = &self.login_gate {
            gate.notified().await;
        }
        self.login_outcome.lock().unwrap().clone()
    }

    async fn current_user(&self, token: &SessionToken) -> Result<UserProfile> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen
            .lock()
            .unwrap()
            .push(token.as_str().to_string());
        if let Some(gate) = &self.me_gate {
            gate.notified().await;
        }
        self.me_outcome.lock().unwrap().clone()
    }

    async fn logout(&self, token: &SessionToken) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen
            .lock()
            .unwrap()
            .push(token.as_str().to_string());
        if self.logout_fails.load(Ordering::SeqCst) {
            Err(offline())
        } else {
            Ok(())
        }
    }
}

/// Build a machine over a memory store seeded with `entries`.
pub fn machine_with(
    backend: &Arc<FakeBackend>,
    entries: &[(&str, &str)],
) -> (AuthMachine, Arc<MemoryStore>) {
    let storage = Arc::new(MemoryStore::with_entries(entries.iter().copied()));
    let machine = AuthMachine::new(backend.clone(), TokenStore::new(storage.clone()));
    (machine, storage)
}

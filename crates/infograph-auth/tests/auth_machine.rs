//! Behavior of the authentication state machine against a scripted backend.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::sync::Notify;

use infograph_auth::{AuthMachine, TokenStore};
use infograph_core::error::{AuthError, Error};
use infograph_core::{
    AuthStatus, KeyValueStore, LoginResponse, ProviderCredential, SessionCredential, SessionToken,
};

use common::{FakeBackend, machine_with, offline, unauthorized, user};

// ============================================================================
// Startup
// ============================================================================

#[test]
fn empty_storage_starts_idle() {
    let backend = Arc::new(FakeBackend::default());
    let (machine, _) = machine_with(&backend, &[]);

    let snapshot = machine.snapshot();
    assert_eq!(snapshot.status, AuthStatus::Idle);
    assert!(snapshot.credential.is_empty());
    assert!(snapshot.error.is_none());
}

#[test]
fn token_without_user_starts_idle_until_hydrated() {
    let backend = Arc::new(FakeBackend::default());
    let (machine, _) = machine_with(&backend, &[("token", "stored")]);

    assert_eq!(machine.status(), AuthStatus::Idle);
    assert_eq!(machine.current_token().unwrap().as_str(), "stored");
    assert!(machine.needs_hydration());
    assert_eq!(backend.me_calls(), 0);
}

#[test]
fn token_with_cached_user_starts_authenticated() {
    let backend = Arc::new(FakeBackend::default());
    let (machine, _) = machine_with(&backend, &[("token", "stored"), ("user", r#"{"id":7}"#)]);

    assert_eq!(machine.status(), AuthStatus::Authenticated);
    assert_eq!(machine.user().unwrap().id().as_deref(), Some("7"));
    assert!(!machine.needs_hydration());
}

#[test]
fn corrupt_cached_user_does_not_break_startup() {
    let backend = Arc::new(FakeBackend::default());
    let (machine, _) = machine_with(&backend, &[("token", "stored"), ("user", "{broken")]);

    assert_eq!(machine.status(), AuthStatus::Idle);
    assert!(machine.user().is_none());
    assert!(machine.is_authenticated());
}

#[test]
fn cached_user_without_token_is_ignored() {
    let backend = Arc::new(FakeBackend::default());
    let (machine, _) = machine_with(&backend, &[("user", r#"{"id":7}"#)]);

    assert!(machine.user().is_none());
    assert_eq!(machine.status(), AuthStatus::Idle);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_success_authenticates_and_persists() {
    let backend = Arc::new(FakeBackend::default());
    let (machine, storage) = machine_with(&backend, &[]);

    let profile = machine
        .login_with_credential(&ProviderCredential::new("abc"))
        .await
        .unwrap();

    assert_eq!(profile, user(json!({"id": 1})));
    let snapshot = machine.snapshot();
    assert_eq!(snapshot.status, AuthStatus::Authenticated);
    assert_eq!(snapshot.token().unwrap().as_str(), "t1");
    assert_eq!(snapshot.user().unwrap(), &user(json!({"id": 1})));

    assert_eq!(storage.get("token").unwrap().as_deref(), Some("t1"));
    let stored_user: serde_json::Value =
        serde_json::from_str(&storage.get("user").unwrap().unwrap()).unwrap();
    assert_eq!(stored_user, json!({"id": 1}));
    assert_eq!(*backend.credentials_seen.lock().unwrap(), vec!["abc".to_string()]);
}

#[tokio::test]
async fn login_failure_records_error_and_clears_session() {
    let backend = Arc::new(FakeBackend::default().with_login(Err(unauthorized("bad credential"))));
    let (machine, storage) = machine_with(&backend, &[("token", "old"), ("user", "{}")]);

    let err = machine
        .login_with_credential(&ProviderCredential::new("abc"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::CredentialExchange { .. })));
    assert!(err.is_unauthorized());

    let snapshot = machine.snapshot();
    assert_eq!(snapshot.status, AuthStatus::Error);
    assert!(snapshot.credential.is_empty());
    assert!(matches!(
        snapshot.error,
        Some(Error::Auth(AuthError::CredentialExchange { .. }))
    ));
    assert!(storage.is_empty());
}

#[tokio::test]
async fn login_with_empty_token_is_a_failed_exchange() {
    let backend = Arc::new(FakeBackend::default().with_login(Ok(LoginResponse {
        token: String::new(),
        user: user(json!({"id": 1})),
    })));
    let (machine, _) = machine_with(&backend, &[]);

    let err = machine
        .login_with_credential(&ProviderCredential::new("abc"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::CredentialExchange { .. })));
    assert_eq!(machine.status(), AuthStatus::Error);
    assert!(machine.current_token().is_none());
}

#[tokio::test]
async fn retry_after_failed_login_clears_previous_error() {
    let backend = Arc::new(FakeBackend::default().with_login(Err(offline())));
    let (machine, _) = machine_with(&backend, &[]);

    let _ = machine
        .login_with_credential(&ProviderCredential::new("abc"))
        .await;
    assert!(machine.last_error().is_some());

    *backend.login_outcome.lock().unwrap() = Ok(LoginResponse {
        token: "t2".to_string(),
        user: user(json!({"id": 2})),
    });
    machine
        .login_with_credential(&ProviderCredential::new("abc"))
        .await
        .unwrap();

    assert_eq!(machine.status(), AuthStatus::Authenticated);
    assert!(machine.last_error().is_none());
}

#[tokio::test]
async fn second_login_while_loading_is_rejected() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::default().with_login_gate(gate.clone()));
    let (machine, _) = machine_with(&backend, &[]);

    let first = tokio::spawn({
        let machine = machine.clone();
        async move {
            machine
                .login_with_credential(&ProviderCredential::new("one"))
                .await
        }
    });
    while machine.status() != AuthStatus::Loading {
        tokio::task::yield_now().await;
    }

    let second = machine
        .login_with_credential(&ProviderCredential::new("two"))
        .await;
    assert!(matches!(
        second,
        Err(Error::Auth(AuthError::OperationInProgress))
    ));

    gate.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(backend.login_calls(), 1);
    assert_eq!(machine.status(), AuthStatus::Authenticated);
}

#[tokio::test(start_paused = true)]
async fn dropped_login_does_not_stay_loading() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::default().with_login_gate(gate));
    let (machine, _) = machine_with(&backend, &[]);

    let attempt = tokio::time::timeout(
        Duration::from_secs(5),
        machine.login_with_credential(&ProviderCredential::new("abc")),
    )
    .await;

    assert!(attempt.is_err());
    assert_eq!(machine.status(), AuthStatus::Error);
    assert!(matches!(
        machine.last_error(),
        Some(Error::Auth(AuthError::Cancelled))
    ));
}

#[tokio::test]
async fn logout_during_login_wins() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::default().with_login_gate(gate.clone()));
    let (machine, storage) = machine_with(&backend, &[]);

    let login = tokio::spawn({
        let machine = machine.clone();
        async move {
            machine
                .login_with_credential(&ProviderCredential::new("abc"))
                .await
        }
    });
    while backend.login_calls() == 0 {
        tokio::task::yield_now().await;
    }

    machine.logout().await;
    gate.notify_one();

    let outcome = login.await.unwrap();
    assert!(matches!(outcome, Err(Error::Auth(AuthError::Superseded))));
    assert_eq!(machine.status(), AuthStatus::Idle);
    assert!(machine.current_token().is_none());
    assert!(storage.is_empty());
}

// ============================================================================
// Hydration
// ============================================================================

#[tokio::test]
async fn hydrate_without_token_is_a_noop() {
    let backend = Arc::new(FakeBackend::default());
    let (machine, _) = machine_with(&backend, &[]);

    assert_eq!(machine.hydrate().await.unwrap(), None);
    assert_eq!(backend.me_calls(), 0);
    assert_eq!(machine.status(), AuthStatus::Idle);
}

#[tokio::test]
async fn hydrate_success_loads_and_caches_user() {
    let backend =
        Arc::new(FakeBackend::default().with_me(Ok(user(json!({"user_id": "u-1", "name": "Ada"})))));
    let (machine, storage) = machine_with(&backend, &[("token", "stored")]);

    let profile = machine.hydrate().await.unwrap().unwrap();

    assert_eq!(profile.id().as_deref(), Some("u-1"));
    assert_eq!(machine.status(), AuthStatus::Authenticated);
    assert_eq!(machine.current_token().unwrap().as_str(), "stored");
    assert_eq!(*backend.tokens_seen.lock().unwrap(), vec!["stored".to_string()]);
    assert!(storage.get("user").unwrap().is_some());
}

#[tokio::test]
async fn hydrate_with_revoked_token_signs_out() {
    let backend = Arc::new(FakeBackend::default().with_me(Err(unauthorized("Invalid token"))));
    let (machine, storage) = machine_with(&backend, &[("token", "revoked")]);

    let err = machine.hydrate().await.unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::Hydration { .. })));
    let snapshot = machine.snapshot();
    assert_eq!(snapshot.status, AuthStatus::Error);
    assert!(snapshot.token().is_none());
    assert!(snapshot.user().is_none());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn concurrent_hydrations_share_one_backend_call() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::default().with_me_gate(gate.clone()));
    let (machine, _) = machine_with(&backend, &[("token", "stored")]);

    let release = async {
        while backend.me_calls() == 0 {
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;
        gate.notify_one();
    };

    let (a, b, ()) = tokio::join!(machine.hydrate(), machine.hydrate(), release);

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(backend.me_calls(), 1);
    assert_eq!(machine.status(), AuthStatus::Authenticated);
}

#[tokio::test]
async fn logout_during_hydration_is_not_undone() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::default().with_me_gate(gate.clone()));
    let (machine, storage) = machine_with(&backend, &[("token", "stored")]);

    let hydration = tokio::spawn({
        let machine = machine.clone();
        async move { machine.hydrate().await }
    });
    while backend.me_calls() == 0 {
        tokio::task::yield_now().await;
    }

    machine.logout().await;
    gate.notify_one();

    assert_eq!(hydration.await.unwrap().unwrap(), None);
    assert_eq!(machine.status(), AuthStatus::Idle);
    assert!(machine.user().is_none());
    assert!(storage.is_empty());
}

#[tokio::test(start_paused = true)]
async fn caller_timeout_on_hydration_signs_out_and_allows_login() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::default().with_me_gate(gate));
    let (machine, storage) = machine_with(&backend, &[("token", "stored")]);

    let attempt = tokio::time::timeout(Duration::from_secs(5), machine.hydrate()).await;

    assert!(attempt.is_err());
    assert_eq!(machine.status(), AuthStatus::Error);
    assert!(matches!(
        machine.last_error(),
        Some(Error::Auth(AuthError::Cancelled))
    ));
    assert!(machine.current_token().is_none());
    assert!(storage.is_empty());

    machine
        .login_with_credential(&ProviderCredential::new("abc"))
        .await
        .unwrap();
    assert_eq!(backend.login_calls(), 1);
    assert_eq!(machine.status(), AuthStatus::Authenticated);
}

#[tokio::test(start_paused = true)]
async fn hydration_continues_while_any_caller_waits() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::default().with_me_gate(gate.clone()));
    let (machine, _) = machine_with(&backend, &[("token", "stored")]);

    let patient = tokio::spawn({
        let machine = machine.clone();
        async move { machine.hydrate().await }
    });
    while backend.me_calls() == 0 {
        tokio::task::yield_now().await;
    }

    let impatient = tokio::time::timeout(Duration::from_secs(1), machine.hydrate()).await;
    assert!(impatient.is_err());
    assert_eq!(machine.status(), AuthStatus::Loading);
    assert!(machine.current_token().is_some());

    gate.notify_one();
    assert!(patient.await.unwrap().unwrap().is_some());
    assert_eq!(machine.status(), AuthStatus::Authenticated);
    assert_eq!(backend.me_calls(), 1);
}

#[tokio::test]
async fn login_supersedes_in_flight_hydration() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::default().with_me_gate(gate.clone()));
    let (machine, storage) = machine_with(&backend, &[("token", "stale")]);

    let hydration = tokio::spawn({
        let machine = machine.clone();
        async move { machine.hydrate().await }
    });
    while backend.me_calls() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(machine.status(), AuthStatus::Loading);

    let profile = machine
        .login_with_credential(&ProviderCredential::new("abc"))
        .await
        .unwrap();
    assert_eq!(profile, user(json!({"id": 1})));

    gate.notify_one();
    assert_eq!(hydration.await.unwrap().unwrap(), None);

    assert_eq!(machine.status(), AuthStatus::Authenticated);
    assert_eq!(machine.current_token().unwrap().as_str(), "t1");
    assert_eq!(storage.get("token").unwrap().as_deref(), Some("t1"));
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn logout_always_resets_even_when_backend_fails() {
    for failing in [false, true] {
        let backend = FakeBackend::default();
        let backend = Arc::new(if failing {
            backend.with_failing_logout()
        } else {
            backend
        });
        let (machine, storage) = machine_with(&backend, &[("token", "t1"), ("user", r#"{"id":1}"#)]);

        machine.logout().await;
        machine.logout().await;

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.status, AuthStatus::Idle);
        assert!(snapshot.token().is_none());
        assert!(snapshot.user().is_none());
        assert!(snapshot.error.is_none());
        assert!(storage.is_empty());
        assert_eq!(backend.logout_calls(), 1, "second logout has no token to send");
    }
}

#[tokio::test]
async fn logout_after_failed_hydration_returns_to_idle() {
    let backend = Arc::new(FakeBackend::default().with_me(Err(unauthorized("expired"))));
    let (machine, _) = machine_with(&backend, &[("token", "expired")]);

    let _ = machine.hydrate().await;
    assert_eq!(machine.status(), AuthStatus::Error);

    machine.logout().await;
    assert_eq!(machine.status(), AuthStatus::Idle);
    assert!(machine.last_error().is_none());
    assert_eq!(backend.logout_calls(), 0);
}

// ============================================================================
// set_credential and change notification
// ============================================================================

#[test]
fn set_credential_persists_and_clears_error() {
    let backend = Arc::new(FakeBackend::default());
    let (machine, storage) = machine_with(&backend, &[]);

    machine.set_credential(SessionCredential::new(
        Some(SessionToken::new("manual").unwrap()),
        None,
    ));

    assert_eq!(storage.get("token").unwrap().as_deref(), Some("manual"));
    assert_eq!(storage.get("user").unwrap(), None);
    assert!(machine.last_error().is_none());
    assert_eq!(machine.status(), AuthStatus::Idle);
}

#[test]
fn set_credential_drops_user_without_token() {
    let backend = Arc::new(FakeBackend::default());
    let (machine, storage) = machine_with(&backend, &[]);

    machine.set_credential(SessionCredential::new(None, Some(user(json!({"id": 3})))));

    assert!(machine.user().is_none());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn listeners_observe_every_transition() {
    let backend = Arc::new(FakeBackend::default());
    let (machine, _) = machine_with(&backend, &[]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    machine.on_auth_change(move |snapshot| sink.lock().unwrap().push(snapshot.status));
    let mut watcher = machine.subscribe();

    machine
        .login_with_credential(&ProviderCredential::new("abc"))
        .await
        .unwrap();
    assert_eq!(watcher.borrow_and_update().status, AuthStatus::Authenticated);

    machine.logout().await;
    assert!(watcher.has_changed().unwrap());
    assert!(watcher.borrow_and_update().credential.is_empty());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            AuthStatus::Loading,
            AuthStatus::Authenticated,
            AuthStatus::Idle
        ]
    );
}

#[test]
fn machine_reads_tokens_it_was_given_not_storage() {
    let backend = Arc::new(FakeBackend::default());
    let storage = Arc::new(infograph_core::MemoryStore::with_entries([("token", "t1")]));
    let machine = AuthMachine::new(backend, TokenStore::new(storage.clone()));

    storage
        .commit(&[infograph_core::StorageOp::put("token", "tampered")])
        .unwrap();

    assert_eq!(machine.current_token().unwrap().as_str(), "t1");
}

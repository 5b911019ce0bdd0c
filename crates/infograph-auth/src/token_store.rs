//! Durable mirror of the session credential.

use std::sync::Arc;

use tracing::{debug, warn};

use infograph_core::traits::{KeyValueStore, StorageOp};
use infograph_core::{Result, SessionCredential, SessionToken, UserProfile};

/// Storage key for the session token.
pub const TOKEN_KEY: &str = "token";

/// Storage key for the cached user profile.
pub const USER_KEY: &str = "user";

/// Reads and writes the session credential in a [`KeyValueStore`].
///
/// Loading never fails: unreadable or malformed entries are logged and
/// treated as absent, so a corrupt cache can only ever log a user out.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Read the persisted credential.
    pub fn load(&self) -> SessionCredential {
        let token = self.read(TOKEN_KEY).and_then(|raw| match SessionToken::new(raw) {
            Ok(token) => Some(token),
            Err(_) => {
                debug!("Ignoring empty persisted token");
                None
            }
        });

        let user = self.read(USER_KEY).and_then(|raw| match UserProfile::from_json(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Failed to parse persisted user profile");
                None
            }
        });

        SessionCredential { token, user }
    }

    /// Persist `credential`, deleting the keys of absent parts.
    ///
    /// Both keys are written in a single batch.
    pub fn save(&self, credential: &SessionCredential) -> Result<()> {
        let batch = [
            match &credential.token {
                Some(token) => StorageOp::put(TOKEN_KEY, token.as_str()),
                None => StorageOp::remove(TOKEN_KEY),
            },
            match &credential.user {
                Some(user) => StorageOp::put(USER_KEY, user.to_json()),
                None => StorageOp::remove(USER_KEY),
            },
        ];

        self.storage.commit(&batch)
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read persisted session");
                None
            }
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

//! infograph-core - Core types and traits for the infograph client.
//!
//! This crate holds everything the authentication stack agrees on: the
//! session token and user profile types, the error taxonomy, client
//! configuration, and the traits at each seam (storage, backend, identity
//! provider, token source).

pub mod config;
pub mod credentials;
pub mod error;
pub mod memory;
pub mod tokens;
pub mod traits;
pub mod types;

pub use config::ClientConfig;
pub use credentials::ProviderCredential;
pub use error::Error;
pub use memory::MemoryStore;
pub use tokens::SessionToken;
pub use traits::{
    AuthBackend, ButtonOptions, CredentialCallback, IdentitySdk, KeyValueStore, LoginResponse,
    ProviderClient, ProviderConfig, StorageOp, TokenSource,
};
pub use types::{ApiBase, AuthSnapshot, AuthStatus, SessionCredential, UserProfile};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

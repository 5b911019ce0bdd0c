//! Core traits at the seams of the authentication stack.

mod backend;
mod identity;
mod storage;
mod token_source;

pub use backend::{AuthBackend, LoginResponse};
pub use identity::{ButtonOptions, CredentialCallback, IdentitySdk, ProviderClient, ProviderConfig};
pub use storage::{KeyValueStore, StorageOp};
pub use token_source::TokenSource;

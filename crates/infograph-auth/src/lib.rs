//! infograph-auth - Client-side authentication lifecycle.
//!
//! This crate implements the parts of the client with real ordering
//! concerns:
//!
//! - [`TokenStore`]: the durable mirror of the session credential
//! - [`IdentityBridge`]: one-shot loading of the identity provider SDK
//! - [`AuthMachine`]: the state machine that owns {token, user, status, error}
//! - [`RouteGuard`]: the asynchronous gate evaluated before navigation
//! - [`AuthContext`]: the object that ties them together at startup
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use infograph_auth::{AuthMachine, NavigationOutcome, RouteGuard, RouteTable, TokenStore};
//! use infograph_core::{AuthBackend, MemoryStore};
//!
//! # async fn example(backend: Arc<dyn AuthBackend>) {
//! let store = TokenStore::new(Arc::new(MemoryStore::new()));
//! let machine = AuthMachine::new(backend, store);
//! let guard = RouteGuard::new(machine.clone(), RouteTable::default());
//!
//! match guard.evaluate("/chat").await {
//!     NavigationOutcome::RedirectToLogin { return_to } => println!("sign in, then {return_to}"),
//!     outcome => println!("{outcome:?}"),
//! }
//! # }
//! ```

pub mod context;
pub mod guard;
pub mod identity;
pub mod machine;
pub mod token_store;

pub use context::{AuthContext, LoginEvents};
pub use guard::{NavigationOutcome, RouteGuard, RouteTable};
pub use identity::{BridgeState, IdentityBridge};
pub use machine::{AuthListener, AuthMachine};
pub use token_store::TokenStore;

//! Validated types for the infograph client.

mod api_base;
mod session;
mod user;

pub use api_base::{ApiBase, DEFAULT_API_BASE};
pub use session::{AuthSnapshot, AuthStatus, SessionCredential};
pub use user::UserProfile;

//! infograph-http - HTTP transport for the infograph client.
//!
//! [`ApiClient`] is the authenticated request pipeline: every request picks
//! up the current session token from a [`TokenSource`] at send time.
//! [`HttpAuthBackend`] implements the authentication endpoints on top of it.
//!
//! [`TokenSource`]: infograph_core::TokenSource

mod backend;
mod client;
pub mod endpoints;

pub use backend::HttpAuthBackend;
pub use client::ApiClient;
pub use reqwest::Method;

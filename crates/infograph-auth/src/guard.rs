//! Navigation gate.

use tracing::{debug, instrument};

use infograph_core::AuthStatus;

use crate::machine::AuthMachine;

/// What the router should do with a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Continue to the requested destination.
    Proceed,
    /// The destination is a static alias for another path.
    Redirect { to: String },
    /// Sign-in is required; come back to `return_to` afterwards.
    RedirectToLogin { return_to: String },
    /// Already signed in; the login page is skipped.
    RedirectToLanding { path: String },
}

/// The application's routes as far as authentication is concerned.
#[derive(Debug, Clone)]
pub struct RouteTable {
    login_path: String,
    landing_path: String,
    protected: Vec<String>,
    aliases: Vec<(String, String)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new("/login", "/chat")
            .protect("/chat")
            .protect("/history")
            .alias("/", "/login")
    }
}

impl RouteTable {
    /// A table with no protected routes or aliases.
    pub fn new(login_path: impl Into<String>, landing_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
            landing_path: landing_path.into(),
            protected: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Require authentication for `prefix` and everything below it.
    pub fn protect(mut self, prefix: impl Into<String>) -> Self {
        self.protected.push(prefix.into());
        self
    }

    pub fn alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.aliases.push((from.into(), to.into()));
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    pub fn requires_auth(&self, destination: &str) -> bool {
        let path = route_path(destination);
        self.protected
            .iter()
            .any(|prefix| is_within(path, prefix))
    }

    pub fn is_login(&self, destination: &str) -> bool {
        route_path(destination) == route_path(&self.login_path)
    }

    fn alias_target(&self, destination: &str) -> Option<&str> {
        let path = route_path(destination);
        self.aliases
            .iter()
            .find(|(from, _)| route_path(from) == path)
            .map(|(_, to)| to.as_str())
    }
}

/// The path part of a destination: no query or fragment, no trailing slash.
fn route_path(destination: &str) -> &str {
    let end = destination.find(['?', '#']).unwrap_or(destination.len());
    let path = &destination[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Whole-segment prefix match: `/chat` covers `/chat/42` but not `/chatter`.
fn is_within(path: &str, prefix: &str) -> bool {
    let prefix = route_path(prefix);
    if prefix == "/" {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Decides every navigation from the authentication state.
///
/// Evaluation is asynchronous: when a token is held but its user has not
/// been loaded, the guard waits for hydration before deciding. Concurrent
/// evaluations share one hydration through the machine; the guard itself
/// does no deduplication.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    machine: AuthMachine,
    routes: RouteTable,
}

impl RouteGuard {
    pub fn new(machine: AuthMachine, routes: RouteTable) -> Self {
        Self { machine, routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[instrument(skip(self))]
    pub async fn evaluate(&self, destination: &str) -> NavigationOutcome {
        if let Some(to) = self.routes.alias_target(destination) {
            return NavigationOutcome::Redirect { to: to.to_string() };
        }

        if self.machine.needs_hydration() {
            if let Err(e) = self.machine.hydrate().await {
                debug!(error = %e, "Hydration failed during navigation");
            }
        }

        let authenticated = self.machine.status() == AuthStatus::Authenticated;

        if self.routes.requires_auth(destination) && !authenticated {
            debug!("Authentication required, redirecting to login");
            return NavigationOutcome::RedirectToLogin {
                return_to: destination.to_string(),
            };
        }

        if self.routes.is_login(destination) && authenticated {
            return NavigationOutcome::RedirectToLanding {
                path: self.routes.landing_path.clone(),
            };
        }

        NavigationOutcome::Proceed
    }
}

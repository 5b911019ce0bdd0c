//! Building the authentication context for a single CLI invocation.

mod provider;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

use infograph_auth::AuthContext;
use infograph_core::{ApiBase, ClientConfig};
use infograph_file::FileStore;
use infograph_http::HttpAuthBackend;

use crate::cli::GlobalArgs;

pub use provider::ManualSdk;

/// Resolve client configuration from flags and environment.
pub fn config(args: &GlobalArgs) -> Result<ClientConfig> {
    let mut config = ClientConfig::default();

    if let Some(ref api_base) = args.api_base {
        let api_base = ApiBase::new(api_base).context("Invalid API base URL")?;
        config = config.with_api_base(api_base);
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}

/// Get the session file path, creating its directory if needed.
pub fn store_path(args: &GlobalArgs) -> Result<PathBuf> {
    let path = match args.store {
        Some(ref path) => path.clone(),
        None => ProjectDirs::from("", "", "infograph")
            .context("Could not determine data directory")?
            .data_dir()
            .join("session.json"),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create data directory")?;
    }

    Ok(path)
}

/// Restore the persisted session into a fresh context.
///
/// `sdk` supplies provider credentials; commands that never sign in pass a
/// provider with no credential to issue.
pub fn open(config: ClientConfig, args: &GlobalArgs, sdk: ManualSdk) -> Result<AuthContext> {
    let path = store_path(args)?;
    debug!(path = %path.display(), api_base = %config.api_base, "Opening session");

    let backend = HttpAuthBackend::new(&config).context("Failed to create HTTP client")?;
    let storage = FileStore::new(&path);

    Ok(AuthContext::new(
        config,
        Arc::new(backend),
        Arc::new(storage),
        Arc::new(sdk),
    ))
}

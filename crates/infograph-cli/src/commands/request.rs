//! Request command implementation.

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use infograph_http::{ApiClient, Method};

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::{self, ManualSdk};

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, DELETE, ...)
    pub method: String,

    /// Path under the API base (e.g. /api/v1/history)
    pub path: String,

    /// JSON request body
    #[arg(long, conflicts_with = "data_file")]
    pub data: Option<String>,

    /// File with the JSON request body (use - for stdin)
    #[arg(long)]
    pub data_file: Option<String>,
}

pub async fn run(global: &GlobalArgs, args: RequestArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .context("Invalid HTTP method")?;
    let body = read_body(&args)?;

    let ctx = session::open(session::config(global)?, global, ManualSdk::silent())?;
    let client = ApiClient::new(ctx.config(), Arc::new(ctx.machine().clone()))
        .context("Failed to create HTTP client")?;

    let response = client
        .send(method, &args.path, body.as_ref())
        .await
        .context("Request failed")?;

    output::json_pretty(&response)?;
    Ok(())
}

fn read_body(args: &RequestArgs) -> Result<Option<Value>> {
    if let Some(ref data) = args.data {
        return serde_json::from_str(data)
            .map(Some)
            .context("Invalid JSON in --data");
    }

    let Some(ref path) = args.data_file else {
        return Ok(None);
    };

    let content = if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).context("Failed to read JSON file")?
    };

    serde_json::from_str(&content)
        .map(Some)
        .context("Invalid JSON in file")
}

//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::{self, ManualSdk};

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(global: &GlobalArgs, _args: LogoutArgs) -> Result<()> {
    let ctx = session::open(session::config(global)?, global, ManualSdk::silent())?;

    if ctx.machine().current_token().is_none() {
        output::warning("No active session");
    }
    ctx.machine().logout().await;

    output::success("Logged out");
    Ok(())
}

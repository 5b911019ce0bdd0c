//! Whoami command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::cli::GlobalArgs;
use crate::session::{self, ManualSdk};

#[derive(Args, Debug)]
pub struct WhoamiArgs {}

pub async fn run(global: &GlobalArgs, _args: WhoamiArgs) -> Result<()> {
    let ctx = session::open(session::config(global)?, global, ManualSdk::silent())?;

    if ctx.machine().current_token().is_none() {
        bail!("No active session. Run 'infograph login' first.");
    }

    let user = ctx
        .machine()
        .hydrate()
        .await
        .context("Stored session is no longer valid and has been cleared")?
        .context("Session changed while validating")?;

    super::print_user(&user);

    Ok(())
}

//! Status command implementation.

use anyhow::Result;
use clap::Args;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::{self, ManualSdk};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the cached user as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(global: &GlobalArgs, args: StatusArgs) -> Result<()> {
    let ctx = session::open(session::config(global)?, global, ManualSdk::silent())?;
    let snapshot = ctx.machine().snapshot();

    output::field("Status", snapshot.status.as_str());
    output::field("Token", if snapshot.token().is_some() { "stored" } else { "none" });

    match snapshot.user() {
        Some(user) if args.json => output::json_pretty(user)?,
        Some(user) => super::print_user(user),
        None if snapshot.token().is_some() => {
            output::field("User", "not loaded (run 'infograph whoami')")
        }
        None => {}
    }

    Ok(())
}

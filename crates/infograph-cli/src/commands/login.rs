//! Login command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::{self, ManualSdk};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Credential (ID token) issued by the identity provider
    #[arg(long)]
    pub credential: String,

    /// OAuth client ID registered with the identity provider
    #[arg(long, env = "INFOGRAPH_GOOGLE_CLIENT_ID")]
    pub client_id: Option<String>,
}

pub async fn run(global: &GlobalArgs, args: LoginArgs) -> Result<()> {
    let config = session::config(global)?.with_google_client_id(args.client_id);
    let ctx = session::open(config, global, ManualSdk::issuing(args.credential))?;

    let mut events = ctx
        .connect_identity()
        .await
        .context("Identity provider unavailable")?;

    eprintln!("{}", "Logging in...".dimmed());
    ctx.identity().prompt();

    let Some(outcome) = events.recv().await else {
        bail!("Identity provider issued no credential");
    };
    let user = outcome.context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    super::print_user(&user);
    output::field("API", ctx.config().api_base.as_str());

    Ok(())
}

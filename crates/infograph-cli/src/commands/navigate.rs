//! Navigate command implementation.

use anyhow::Result;
use clap::Args;

use infograph_auth::NavigationOutcome;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::{self, ManualSdk};

#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// Destination path, optionally with a query (e.g. /chat?id=4)
    pub path: String,
}

pub async fn run(global: &GlobalArgs, args: NavigateArgs) -> Result<()> {
    let ctx = session::open(session::config(global)?, global, ManualSdk::silent())?;
    let outcome = ctx.guard().evaluate(&args.path).await;

    match outcome {
        NavigationOutcome::Proceed => {
            output::field("Outcome", "proceed");
            output::field("Location", &args.path);
        }
        NavigationOutcome::Redirect { to } => {
            output::field("Outcome", "redirect");
            output::field("Location", &to);
        }
        NavigationOutcome::RedirectToLogin { return_to } => {
            output::field("Outcome", "login required");
            output::field("Location", ctx.guard().routes().login_path());
            output::field("Return to", &return_to);
        }
        NavigationOutcome::RedirectToLanding { path } => {
            output::field("Outcome", "already signed in");
            output::field("Location", &path);
        }
    }

    Ok(())
}

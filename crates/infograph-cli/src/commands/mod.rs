//! Subcommand implementations.

mod login;
mod logout;
mod navigate;
mod request;
mod status;
mod whoami;

use anyhow::Result;
use clap::Subcommand;

use infograph_core::UserProfile;

use crate::cli::GlobalArgs;
use crate::output;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with an identity provider credential
    Login(login::LoginArgs),

    /// Validate the stored session and display the user
    Whoami(whoami::WhoamiArgs),

    /// Show the stored session without contacting the backend
    Status(status::StatusArgs),

    /// End the session
    Logout(logout::LogoutArgs),

    /// Ask the route guard where a navigation would end up
    Navigate(navigate::NavigateArgs),

    /// Send an authenticated request to the backend
    Request(request::RequestArgs),
}

pub async fn handle(global: GlobalArgs, command: Command) -> Result<()> {
    match command {
        Command::Login(args) => login::run(&global, args).await,
        Command::Whoami(args) => whoami::run(&global, args).await,
        Command::Status(args) => status::run(&global, args).await,
        Command::Logout(args) => logout::run(&global, args).await,
        Command::Navigate(args) => navigate::run(&global, args).await,
        Command::Request(args) => request::run(&global, args).await,
    }
}

/// Print the fields of a user profile that are usually present.
fn print_user(user: &UserProfile) {
    if let Some(id) = user.id() {
        output::field("User", &id);
    }
    for (label, key) in [("Name", "name"), ("Email", "email")] {
        if let Some(value) = user.get_str(key) {
            output::field(label, value);
        }
    }
}

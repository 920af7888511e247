//! Command dispatch: bridges CLI args -> API client calls -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod devices;
pub mod logs;
pub mod overview;
pub mod reports;
pub mod temp;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::ApiContext;
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &ApiContext, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(ctx, args, global).await,
        Command::Logout => auth::logout(ctx, global).await,
        Command::Whoami => auth::whoami(ctx, global).await,
        Command::Overview => overview::handle(ctx, global).await,
        Command::Devices(args) => devices::handle(ctx, args, global).await,
        Command::Logs(args) => logs::handle(ctx, args, global).await,
        Command::Reports(args) => reports::handle(ctx, args, global).await,
        Command::Temp(args) => temp::handle(ctx, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

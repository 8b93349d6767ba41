//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod blueprint;
pub mod config_cmd;
pub mod device;
pub mod items;
pub mod resources;
pub mod util;

use aosom_api::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &mut Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => items::list(session, args, global).await,
        Command::Show(args) => items::show(session, args, global).await,
        Command::Create(args) => items::create(session, args, global).await,
        Command::Delete(args) => items::delete(session, args, global).await,
        Command::Export(args) => items::export(session, args, global).await,
        Command::Blueprint(args) => blueprint::handle(session, args, global).await,
        Command::Device(args) => device::handle(session, args, global).await,
        // Resources, Config and Completions are handled before login
        Command::Resources | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

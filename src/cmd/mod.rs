//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`] or [`health`]. Each handler lives in its
//! own submodule.

pub mod health;
pub mod run;

use crate::cli::{Cli, Commands};
use crate::error::ApiError;

pub async fn dispatch(cli: Cli) -> Result<(), ApiError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(args).await,
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  api-template v{version} \u{2014} minimal HTTP service template\n\n  \
         No command provided. To get started:\n\n    \
         api-template run                  Start the server on 0.0.0.0:3000\n    \
         api-template health               Probe a running instance\n    \
         api-template --help               See all commands and options\n"
    );
}

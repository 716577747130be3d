use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;
use crate::util::provide_root;
use crate::AppError;

#[derive(Parser, Debug)]
#[clap(name = "deeplink")]
#[clap(
    about = "Hand credentials to the clock-in app and keep what it sends back",
    long_about = None
)]
pub struct Cli {
    #[clap(
        long,
        global = true,
        value_parser,
        help = "Folder holding preferences and handlers (default: ~/.deeplink)"
    )]
    pub root: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<(), AppError> {
        let root = provide_root(&self.root)?;
        log::debug!("using data folder {}", root.display());

        match &self.command {
            Commands::Config { subcommand } => subcommand.run(&root),
            Commands::Send(send) => send.run(&root),
            Commands::Receive(receive) => receive.run(&root),
            Commands::Show(show) => show.run(&root),
            Commands::Reset(reset) => reset.run(&root),
            Commands::Reply(reply) => reply.run(&root),
            Commands::Handler { subcommand } => subcommand.run(&root),
            Commands::Install(install) => install.run(&root),
        }
    }
}

use std::path::Path;

use clap::Subcommand;

use crate::util::open_registry;
use crate::AppError;

/// Available commands for the `handler` subcommand
#[derive(Subcommand, Debug)]
pub enum Handler {
    #[command(about = "Open links of a scheme with a command")]
    Register {
        #[clap(help = "URI scheme, e.g. clockin")]
        scheme: String,
        #[clap(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            help = "Command to start; the link is passed as last argument"
        )]
        command: Vec<String>,
    },
    #[command(about = "Forget the command registered for a scheme")]
    Unregister { scheme: String },
    #[command(about = "List registered schemes")]
    List,
}

impl Handler {
    pub fn run(&self, root: &Path) -> Result<(), AppError> {
        let mut registry = open_registry(root)?;

        match self {
            Handler::Register { scheme, command } => {
                if command.is_empty() {
                    return Err(AppError::MissingCommand);
                }
                registry.register(scheme, command)?;
                println!("{} links now open with {:?}", scheme, command);
            }
            Handler::Unregister { scheme } => {
                registry.unregister(scheme)?;
                println!("{} unregistered", scheme);
            }
            Handler::List => {
                let handlers = registry.handlers();
                if handlers.is_empty() {
                    println!("No handlers registered.");
                }
                for handler in handlers {
                    println!("{}: {:?}", handler.scheme, handler.command);
                }
            }
        }

        Ok(())
    }
}

use std::path::Path;

use deeplink::{Dispatcher, Outbound, StorePage};

use crate::util::{confirm, open_preferences, open_registry};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "send", about = "Open the clock-in app with the stored fields")]
pub struct Dispatch {
    #[clap(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help = "Open the store page without asking if the app is missing"
    )]
    yes: bool,
}

impl Dispatch {
    pub fn run(&self, root: &Path) -> Result<(), AppError> {
        let mut preferences = open_preferences(root)?;
        let registry = open_registry(root)?;
        let dispatcher =
            Dispatcher::new(&mut preferences, &registry, &registry);

        match dispatcher.send_configured() {
            Outbound::FillFieldsPrompt { missing } => {
                println!(
                    "Please fill in all fields first: {}",
                    missing.join(", ")
                );
                println!("Use `deeplink config set <field> <value>`.");
            }
            Outbound::InstallPrompt { .. } => {
                println!("The clock-in app is not installed.");
                if self.yes || confirm("Do you want to install it?")? {
                    let opened = StorePage::default().open(&registry)?;
                    println!("Opened {}", opened);
                }
            }
            Outbound::Dispatched { .. } => {
                println!("Clock-in app opened.");
            }
            Outbound::LaunchFailed { reason } => {
                println!("The clock-in app could not be opened: {}", reason);
            }
        }

        Ok(())
    }
}

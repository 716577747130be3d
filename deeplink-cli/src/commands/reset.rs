use std::path::Path;

use deeplink::Dispatcher;

use crate::util::{open_preferences, open_registry};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "reset", about = "Forget the clock-ins received last")]
pub struct Reset {}

impl Reset {
    pub fn run(&self, root: &Path) -> Result<(), AppError> {
        let mut preferences = open_preferences(root)?;
        let registry = open_registry(root)?;
        Dispatcher::new(&mut preferences, &registry, &registry).reset()?;

        println!("Clock-ins: 0");
        Ok(())
    }
}

use std::path::Path;

use deeplink::Dispatcher;

use crate::util::{open_preferences, open_registry};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(
    name = "reply",
    about = "Send the cached clock-ins back to the app registered for a scheme"
)]
pub struct Reply {
    #[clap(help = "Scheme of the application to answer, e.g. myapp")]
    scheme: String,
}

impl Reply {
    pub fn run(&self, root: &Path) -> Result<(), AppError> {
        let mut preferences = open_preferences(root)?;
        let registry = open_registry(root)?;
        let dispatcher =
            Dispatcher::new(&mut preferences, &registry, &registry);

        let records = dispatcher.cached_records();
        dispatcher.reply(&self.scheme, &records)?;
        println!("Sent {} clock-ins to {}.", records.len(), self.scheme);

        Ok(())
    }
}

use std::path::Path;

use deeplink::{Dispatcher, Inbound, InboundRequest, Summary};
use url::Url;

use crate::commands::show::render_summary;
use crate::util::{open_preferences, open_registry};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "receive", about = "Handle a link opened by the clock-in app")]
pub struct Receive {
    #[clap(help = "Link as delivered by the OS, e.g. myapp://clockin?data=...")]
    link: String,
}

impl Receive {
    pub fn run(&self, root: &Path) -> Result<(), AppError> {
        println!("{}", render_summary(&self.handle(root)?));
        Ok(())
    }

    /// What the display shows once the link is handled
    pub fn handle(&self, root: &Path) -> Result<Summary, AppError> {
        let link = Url::parse(&self.link)
            .map_err(|e| AppError::InvalidLink(e.to_string()))?;

        let mut preferences = open_preferences(root)?;
        let registry = open_registry(root)?;
        let mut dispatcher =
            Dispatcher::new(&mut preferences, &registry, &registry);

        Ok(match dispatcher.receive(&mut InboundRequest::new(link)) {
            Inbound::Received(summary) => summary,
            Inbound::Idle => Summary::zero(),
        })
    }
}

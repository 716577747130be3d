use std::path::Path;

use deeplink::{Dispatcher, LinkError, Summary};

use crate::util::{open_preferences, open_registry};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "show", about = "Show the clock-ins received last")]
pub struct Show {
    #[clap(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help = "Pretty-print the records"
    )]
    pretty: bool,
}

impl Show {
    pub fn run(&self, root: &Path) -> Result<(), AppError> {
        println!("{}", self.render(root)?);
        Ok(())
    }

    pub fn render(&self, root: &Path) -> Result<String, AppError> {
        let mut preferences = open_preferences(root)?;
        let registry = open_registry(root)?;
        let dispatcher =
            Dispatcher::new(&mut preferences, &registry, &registry);

        let summary = dispatcher.summary();
        if !self.pretty || summary.is_zero() {
            return Ok(render_summary(&summary));
        }

        let records = serde_json::to_string_pretty(
            &dispatcher.cached_records(),
        )
        .map_err(LinkError::from)?;
        Ok(format!("Clock-ins: {}\n{}", summary.count, records))
    }
}

pub fn render_summary(summary: &Summary) -> String {
    format!("Clock-ins: {}\n{}", summary.count, summary.payload_text())
}

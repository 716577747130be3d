use std::path::Path;

use deeplink::StorePage;

use crate::util::open_registry;
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "install", about = "Open the store page of the clock-in app")]
pub struct Install {
    #[clap(long, help = "Package to look up instead of the clock-in app")]
    package: Option<String>,
}

impl Install {
    pub fn run(&self, root: &Path) -> Result<(), AppError> {
        let registry = open_registry(root)?;
        let page = match &self.package {
            Some(package) => StorePage::new(package),
            None => StorePage::default(),
        };

        let opened = page.open(&registry)?;
        println!("Opened {}", opened);
        Ok(())
    }
}

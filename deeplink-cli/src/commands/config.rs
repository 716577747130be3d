use std::path::Path;

use clap::Subcommand;
use deeplink::StoreKey;

use crate::util::open_preferences;
use crate::AppError;

const MASK: &str = "******";

/// Available commands for the `config` subcommand
#[derive(Subcommand, Debug)]
pub enum Config {
    #[command(about = "Print one field, or all of them")]
    Get {
        #[clap(help = "Field name, e.g. tenant or appScheme")]
        field: Option<String>,
        #[clap(
            long,
            action = clap::ArgAction::SetTrue,
            help = "Print the password in clear"
        )]
        reveal: bool,
    },
    #[command(about = "Store a field")]
    Set {
        #[clap(help = "Field name, e.g. tenant or appScheme")]
        field: String,
        value: String,
    },
    #[command(about = "Remove a stored field")]
    Clear {
        #[clap(help = "Field name, e.g. tenant or appScheme")]
        field: String,
    },
    #[command(about = "Delete every stored field and the cached clock-ins")]
    Wipe,
}

impl Config {
    pub fn run(&self, root: &Path) -> Result<(), AppError> {
        let mut preferences = open_preferences(root)?;

        match self {
            Config::Get { field, reveal } => {
                let keys = match field {
                    Some(field) => vec![field.parse::<StoreKey>()?],
                    None => StoreKey::ALL
                        .into_iter()
                        .filter(|key| *key != StoreKey::ClockIns)
                        .collect(),
                };
                for key in keys {
                    let value = match preferences.fetch(key) {
                        Some(_) if key == StoreKey::Password && !reveal => {
                            MASK.to_owned()
                        }
                        Some(value) => value,
                        None => "-".to_owned(),
                    };
                    println!("{}: {}", key, value);
                }
            }
            Config::Set { field, value } => {
                let key = field.parse::<StoreKey>()?;
                preferences.set(key, Some(value.as_str()))?;
                println!("{} saved", key);
            }
            Config::Clear { field } => {
                let key = field.parse::<StoreKey>()?;
                preferences.clear(key)?;
                println!("{} cleared", key);
            }
            Config::Wipe => {
                preferences.erase()?;
                println!("Preferences deleted");
            }
        }

        Ok(())
    }
}

//! Finding and launching the application registered for a link.
//!
//! On a phone this is the OS activity resolver. [`HandlerRegistry`] plays
//! that role on a desktop: a file mapping URI schemes to the program (and
//! its arguments) that should be started with the link as last argument.

use std::path::Path;
use std::process::Command;

use url::Url;

use crate::link::redact;
use crate::storage::base_storage::BaseStorage;
use crate::storage::file_storage::FileStorage;
use crate::{LinkError, Result};

const LABEL: &str = "handlers";

/// How the launched application should treat the current task stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchFlags {
    pub new_task: bool,
    pub clear_task: bool,
    pub no_history: bool,
}

impl LaunchFlags {
    /// The receiver replaces the current task and leaves no history entry
    pub const TASK_RESET: LaunchFlags = LaunchFlags {
        new_task: true,
        clear_task: true,
        no_history: true,
    };

    pub const NEW_TASK: LaunchFlags = LaunchFlags {
        new_task: true,
        clear_task: false,
        no_history: false,
    };
}

/// An application able to open links of one scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub scheme: String,
    /// Program followed by its arguments, kept apart so paths may hold spaces
    pub command: Vec<String>,
}

pub trait Resolver {
    /// Handlers able to open `url`, empty when nothing is installed
    fn resolve(&self, url: &Url) -> Vec<Handler>;

    fn can_resolve(&self, url: &Url) -> bool {
        !self.resolve(url).is_empty()
    }
}

pub trait Launcher {
    /// Hand `url` over to its handler without waiting for it
    fn launch(&self, url: &Url, flags: LaunchFlags) -> Result<()>;
}

pub struct HandlerRegistry {
    storage: FileStorage<String, Vec<String>>,
}

impl HandlerRegistry {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            storage: FileStorage::load(LABEL.to_owned(), path)?,
        })
    }

    /// Register `command` (program, then arguments) for `scheme`, replacing
    /// any previous handler
    pub fn register<S: AsRef<str>>(
        &mut self,
        scheme: &str,
        command: &[S],
    ) -> Result<()> {
        let program_is_blank = command
            .first()
            .map_or(true, |program| program.as_ref().trim().is_empty());
        if program_is_blank {
            return Err(LinkError::Storage(
                LABEL.to_owned(),
                format!("Empty command for scheme {}", scheme),
            ));
        }

        let command = command
            .iter()
            .map(|part| part.as_ref().to_owned())
            .collect();
        self.storage.set(scheme.to_ascii_lowercase(), command);
        self.storage.write_fs()
    }

    pub fn unregister(&mut self, scheme: &str) -> Result<()> {
        self.storage.remove(&scheme.to_ascii_lowercase())?;
        self.storage.write_fs()
    }

    pub fn handlers(&self) -> Vec<Handler> {
        self.storage
            .as_ref()
            .iter()
            .map(|(scheme, command)| Handler {
                scheme: scheme.clone(),
                command: command.clone(),
            })
            .collect()
    }
}

impl Resolver for HandlerRegistry {
    fn resolve(&self, url: &Url) -> Vec<Handler> {
        // `Url` already lowercases the scheme
        self.storage
            .get(&url.scheme().to_owned())
            .map(|command| Handler {
                scheme: url.scheme().to_owned(),
                command: command.clone(),
            })
            .into_iter()
            .collect()
    }
}

impl Launcher for HandlerRegistry {
    fn launch(&self, url: &Url, flags: LaunchFlags) -> Result<()> {
        let handler = self
            .resolve(url)
            .into_iter()
            .next()
            .ok_or_else(|| LinkError::ReceiverUnavailable(redact(url)))?;

        let (program, args) =
            handler.command.split_first().ok_or_else(|| {
                LinkError::Launch(redact(url), "Empty command".to_owned())
            })?;

        // Desktop processes have no task stack, the flags are informative
        log::debug!("launching {} with {:?}", redact(url), flags);
        let child = Command::new(program)
            .args(args)
            .arg(url.as_str())
            .spawn()
            .map_err(|err| LinkError::Launch(redact(url), err.to_string()))?;

        log::info!(
            "{} handed to {} (pid {})",
            redact(url),
            program,
            child.id()
        );
        Ok(())
    }
}

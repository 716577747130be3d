use deeplink::LinkError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Couldn't retrieve home directory!")]
    HomeDirNotFound,

    #[error("Couldn't create data directory: {0}")]
    DataDirectoryCreationError(String),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Handler command was not provided")]
    MissingCommand,

    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error(transparent)]
    LinkError(#[from] LinkError),
}

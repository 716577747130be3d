use thiserror::Error;

pub type Result<T> = std::result::Result<T, LinkError>;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parsing error")]
    Parse,
    #[error("Storage error: {0} {1}")]
    Storage(String, String),
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("No handler is installed for {0}")]
    ReceiverUnavailable(String),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error("Failed to launch {0}: {1}")]
    Launch(String, String),
    #[error("Invalid link: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for LinkError {
    fn from(_: serde_json::Error) -> Self {
        Self::Parse
    }
}

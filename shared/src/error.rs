use thiserror::Error;

/// Fatal failures. The first one aborts the run; `main` reports it once
/// and maps it to the process exit status.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API returned an error response: {0}")]
    Api(String),
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected response payload: {0}")]
    Decode(String),
    #[error("Destination error: {0}")]
    Destination(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Interrupted")]
    Interrupted,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Destination(err.to_string())
    }
}

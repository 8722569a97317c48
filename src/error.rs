use thiserror::Error;

/// Failures of the persistence slot backing the record store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read slot '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to write slot '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to serialize transactions: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("amount {0} cannot be stored without changing its value")]
    Unrepresentable(String),
}

/// Failures of the advisory client. Never shown to the user directly.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("advisor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed advisor response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_decode() {
            RequestError::Malformed(err.to_string())
        } else {
            RequestError::Transport(err.to_string())
        }
    }
}

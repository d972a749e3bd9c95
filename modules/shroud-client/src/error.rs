use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShroudError>;

#[derive(Debug, Error)]
pub enum ShroudError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the service, regardless of body.
    #[error("Server error: {status}")]
    Api { status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    /// The response body carried an `error` field; message is verbatim.
    #[error("{0}")]
    ServerReported(String),
}

impl From<reqwest::Error> for ShroudError {
    fn from(err: reqwest::Error) -> Self {
        ShroudError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ShroudError {
    fn from(err: serde_json::Error) -> Self {
        ShroudError::Parse(err.to_string())
    }
}

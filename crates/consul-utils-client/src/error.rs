// Error types for ConsulClient

/// Errors that can occur during Consul client operations
#[derive(Debug, thiserror::Error)]
pub enum ConsulError {
    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Write rejected by server: {0}")]
    WriteRejected(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid base64 value: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ConsulError>;

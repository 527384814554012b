use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to send log entry: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to encode log entry: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to start dispatch runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("invalid collector host {0:?}")]
    InvalidHost(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("logger is already initialized")]
    AlreadyInitialized,
}

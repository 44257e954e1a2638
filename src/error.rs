use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

/// Failures while setting up an exporter
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("http server error: {0}")]
    Http(String),
}

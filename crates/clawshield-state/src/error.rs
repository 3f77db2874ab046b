use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("persistence lookup failed: {0}")]
    Store(String),

    #[error("serialization failure: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("database failure: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization failure: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("seal/unseal failure: {0}")]
    Crypto(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

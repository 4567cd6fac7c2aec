use freezer_core::FreezerError;
use thiserror::Error;

use crate::store::AnyStoreError;

#[derive(Debug, Error)]
pub enum FrzError {
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid environment in FREEZER_ENV: {0}")]
    Environment(String),

    #[error("Store error: {0}")]
    Store(#[from] AnyStoreError),

    #[error(transparent)]
    Freezer(#[from] FreezerError),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Expiration out of range: {0} days from now")]
    InvalidExpiration(i64),
}

impl FrzError {
    pub fn is_simulated(&self) -> bool {
        matches!(self, FrzError::Freezer(err) if err.is_simulated())
    }
}

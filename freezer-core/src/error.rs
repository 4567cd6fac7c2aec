use std::fmt;

use thiserror::Error;

use crate::item::ItemId;
use crate::key::RecordKey;

/// The kind of write a simulated failure interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Create => write!(f, "item creation"),
            Mutation::Update => write!(f, "item update"),
            Mutation::Delete => write!(f, "item deletion"),
        }
    }
}

/// Error type for repository and view-state operations.
#[derive(Debug, Error)]
pub enum FreezerError {
    /// Deliberately injected by the fault policy. Nothing was written.
    #[error("simulated failure during {0}")]
    SimulatedFailure(Mutation),

    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to encode record {key}: {message}")]
    Encode { key: RecordKey, message: String },

    #[error("failed to decode record {key}: {message}")]
    Decode { key: RecordKey, message: String },

    #[error("invalid item {id:?}: {reason}")]
    InvalidItem { id: ItemId, reason: String },
}

impl FreezerError {
    pub(crate) fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        FreezerError::Store(Box::new(err))
    }

    /// True for failures injected by the fault policy, which a retry may clear.
    pub fn is_simulated(&self) -> bool {
        matches!(self, FreezerError::SimulatedFailure(_))
    }
}

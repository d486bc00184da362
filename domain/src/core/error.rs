//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown response modality: {0}")]
    InvalidModality(String),

    #[error("Unknown media resolution: {0}")]
    InvalidMediaResolution(String),

    #[error("Model identifier cannot be empty")]
    EmptyModel,

    #[error("A turn must contain at least one part")]
    EmptyTurn,
}

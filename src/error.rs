//! Error types for fledge.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input shape: expected {expected} values, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },

    #[error("genome length mismatch: expected {expected} weights, got {actual}")]
    GenomeLengthMismatch { expected: usize, actual: usize },

    #[error("population must hold at least one individual")]
    EmptyPopulation,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("index {index} out of bounds for population of {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

use thiserror::Error;

use crate::commitment::CommitmentError;
use crate::config::ConfigError;
use crate::reference::ReferenceError;

/// Every failure a [`DaClient`](crate::client::DaClient) call can report.
///
/// Backend messages are passed through verbatim; nothing here is retried.
#[derive(Error, Debug)]
pub enum DaError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Commitment(#[from] CommitmentError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The retrieved blob does not hash to the commitment in its reference.
    /// The blob is discarded.
    #[error("commitments don't match: expected {expected}, got {actual}")]
    CommitmentMismatch { expected: String, actual: String },
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    #[error("retrieval failed: {0}")]
    RetrievalFailed(String),
    #[error("health check failed: {0}")]
    HealthCheck(String),
    #[error("client initialization failed: {0}")]
    Initialization(String),
    #[error("client is closed")]
    ClientClosed,
}

impl DaError {
    pub fn commitment_mismatch(expected: &[u8; 32], actual: &[u8; 32]) -> Self {
        DaError::CommitmentMismatch {
            expected: hex::encode(expected),
            actual:   hex::encode(actual),
        }
    }

    /// Whether this is the `InvalidSize` failure of the reference codec.
    pub fn is_invalid_size(&self) -> bool {
        matches!(self, DaError::Reference(ReferenceError::InvalidSize { .. }))
    }

    pub fn is_invalid_network(&self) -> bool {
        matches!(self, DaError::Config(ConfigError::InvalidNetwork(_)))
    }
}

pub type Result<T, E = DaError> = std::result::Result<T, E>;

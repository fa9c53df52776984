//! Error types for replication

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplicationError {
    #[error("Slide not found in replica: {0}")]
    SlideNotFound(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Replica is malformed: {0}")]
    Malformed(String),

    #[error("Replication stopped before completion")]
    Interrupted,
}

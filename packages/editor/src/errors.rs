//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Component {component_id} on slide {slide_id} is protected")]
    ProtectedComponent {
        slide_id: String,
        component_id: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Failure reported by a persistence sink
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Flush rejected: {message}")]
pub struct PersistenceError {
    pub message: String,
}

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

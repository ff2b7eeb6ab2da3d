//! Error types for Tessera

use thiserror::Error;

/// Main error type for Tessera operations
#[derive(Debug, Error)]
pub enum TesseraError {
    /// Error in solver or phase configuration, raised before solving starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// The solution partitioner failed or produced an unusable partition set
    #[error("Partitioning error: {0}")]
    Partitioning(String),

    /// A partition worker failed while running its nested phases
    #[error("Partition {part_index} failed: {message}")]
    PartFailed { part_index: usize, message: String },

    /// The incrementally maintained score disagrees with the expected score
    #[error(
        "Score corruption after {completed_action}: expected {expected} but was {actual}"
    )]
    ScoreCorruption {
        completed_action: String,
        expected: String,
        actual: String,
    },

    /// Shadow variables were not updated after a step
    #[error(
        "Stale shadow variables after {completed_action}: working score {expected} \
         but {actual} after refreshing all shadow variables"
    )]
    ShadowVariableStale {
        completed_action: String,
        expected: String,
        actual: String,
    },

    /// A worker thread could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Invalid operation for current solver state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TesseraError {
    /// Returns true for errors produced by the consistency assertions.
    pub fn is_assertion_failure(&self) -> bool {
        matches!(
            self,
            TesseraError::ScoreCorruption { .. } | TesseraError::ShadowVariableStale { .. }
        )
    }
}

/// Result type alias for Tessera operations
pub type Result<T> = std::result::Result<T, TesseraError>;

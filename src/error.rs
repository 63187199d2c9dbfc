
use thiserror::Error;

/// Failures surfaced by the tree, distance, problem, and solver components.
/// None of these are retried internally, they are handed back to whoever called the failing build or solve.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConsensusError {
    /// A bracket string is unbalanced or contains a symbol outside of its alphabet
    #[error("Invalid structure {structure:?}: {reason}")]
    InvalidStructure {
        structure: String,
        reason: String
    },
    /// A solver, transform, or matrix was given out-of-domain parameters
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A group of candidates is empty, so no gene can be chosen for it
    #[error("Group {0} has no candidates")]
    EmptyRange(usize)
}

impl ConsensusError {
    /// Shorthand for building an `InvalidStructure` error
    pub fn invalid_structure(structure: &str, reason: impl Into<String>) -> ConsensusError {
        ConsensusError::InvalidStructure {
            structure: structure.to_string(),
            reason: reason.into()
        }
    }

    /// Shorthand for building a `Configuration` error
    pub fn configuration(message: impl Into<String>) -> ConsensusError {
        ConsensusError::Configuration(message.into())
    }
}

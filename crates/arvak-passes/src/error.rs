//! Error types for the pass framework.

use arvak_circuit::CircuitError;
use thiserror::Error;

/// Errors that can occur while composing or applying passes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the circuit crate.
    #[error("Circuit error: {0}")]
    Circuit(#[from] CircuitError),

    /// A precondition failed at runtime, or an audited postcondition did not
    /// hold after the transform ran.
    #[error("Predicate requirements are not satisfied: {0}")]
    UnsatisfiedPredicate(String),

    /// Two passes cannot be sequenced: the first one provably breaks a
    /// requirement of the second.
    #[error("Cannot compose these passes due to mismatching predicates of type: {kind}")]
    IncompatiblePasses {
        /// Name of the predicate kind in conflict.
        kind: String,
    },

    /// Implication or meet was asked of predicates that do not support it.
    #[error("{0}")]
    IncorrectPredicate(String),

    /// The predicate cache of a compilation unit was initialized twice.
    #[error("Predicate cache has already been initialized")]
    CacheAlreadyInitialized,

    /// A sequence pass was built from an empty list.
    #[error("Cannot generate a pass from an empty sequence")]
    EmptySequence,

    /// Unit correspondence maps are inconsistent.
    #[error("Unit map mismatch: {0}")]
    UnitMapMismatch(String),

    /// Invalid pass or predicate configuration.
    #[error("Invalid pass configuration: {0}")]
    InvalidConfiguration(String),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    pub(crate) fn incompatible(kind: impl std::fmt::Display) -> Self {
        CompileError::IncompatiblePasses {
            kind: kind.to_string(),
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        CompileError::InvalidConfiguration(msg.into())
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

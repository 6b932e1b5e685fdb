//! Error types for the circuit crate.

use crate::unit::{UnitId, UnitKind};
use thiserror::Error;

/// Errors that can occur while building or rewriting a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CircuitError {
    /// Structural violation: boundary or arity mismatch, illegal join,
    /// illegal Boolean rewrite.
    #[error("Circuit invalidity: {0}")]
    CircuitInvalidity(String),

    /// Operation not supported on this circuit or operation.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Operation requires a circuit with only default registers.
    #[error("Function only allowed for simple circuits (default registers only)")]
    SimpleOnly,

    /// Vertex handle does not refer to a live vertex.
    #[error("Vertex not found in circuit graph")]
    MissingVertex,

    /// Edge handle does not refer to a live edge.
    #[error("Edge not found in circuit graph")]
    MissingEdge,

    /// Unit is not part of the circuit boundary.
    #[error("Unit {unit} not found in circuit")]
    UnitNotFound {
        /// The unit that was not found.
        unit: UnitId,
    },

    /// Unit appears more than once where uniqueness is required.
    #[error("Duplicate unit {unit}")]
    DuplicateUnit {
        /// The duplicate unit.
        unit: UnitId,
    },

    /// Operation was given the wrong number of arguments.
    #[error("Operation '{op}' expects {expected} arguments, got {got}")]
    ArgumentCountMismatch {
        /// Name of the operation.
        op: String,
        /// Number of ports in the operation signature.
        expected: usize,
        /// Number of arguments supplied.
        got: usize,
    },

    /// Unit kind does not match the wire kind expected on a port.
    #[error("Unit {unit} cannot be used where a {expected} unit is expected")]
    UnitKindMismatch {
        /// The offending unit.
        unit: UnitId,
        /// The kind the port requires.
        expected: UnitKind,
    },
}

impl CircuitError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CircuitError::CircuitInvalidity(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        CircuitError::Unsupported(msg.into())
    }
}

/// Result type for circuit operations.
pub type CircuitResult<T> = Result<T, CircuitError>;

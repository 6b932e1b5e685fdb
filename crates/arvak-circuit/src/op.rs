//! The operation capability trait.
//!
//! Operations form an open set: the core only relies on the methods of
//! [`Operation`], so user-defined operations plug in next to the built-in
//! ones in [`crate::gate`] and [`crate::builtin`].

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{CircuitError, CircuitResult};
use crate::parameter::{ParameterExpression, SymbolMap};
use crate::unit::UnitKind;

/// Shared, immutable handle to an operation.
pub type OpRef = Arc<dyn Operation>;

/// Kind of data carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WireKind {
    /// Quantum data.
    Quantum,
    /// Classical data written by an operation.
    Classical,
    /// Read-only dependency on a classical value.
    Boolean,
    /// Auxiliary WASM state.
    Wasm,
    /// Auxiliary RNG state.
    Rng,
}

impl WireKind {
    /// Linear wires carry exactly one in-edge and one out-edge per port.
    #[inline]
    pub fn is_linear(self) -> bool {
        !matches!(self, WireKind::Boolean)
    }

    /// The unit kind a port of this wire kind is bound to.
    pub fn unit_kind(self) -> UnitKind {
        match self {
            WireKind::Quantum => UnitKind::Qubit,
            WireKind::Classical | WireKind::Boolean => UnitKind::Bit,
            WireKind::Wasm => UnitKind::WasmState,
            WireKind::Rng => UnitKind::RngState,
        }
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Ordered list of wire kinds, one per port.
pub type Signature = Vec<WireKind>;

/// Capability set of an operation placed on a circuit node.
pub trait Operation: fmt::Debug + Send + Sync + Any {
    /// Kind tag, e.g. `"cx"` or `"measure"`.
    fn name(&self) -> &str;

    /// Wire kind expected on each port.
    fn signature(&self) -> Signature;

    /// Symbolic parameters, if any.
    fn params(&self) -> Vec<ParameterExpression> {
        Vec::new()
    }

    /// Inverse of this operation.
    fn dagger(&self) -> CircuitResult<OpRef> {
        Err(CircuitError::unsupported(format!(
            "Cannot dagger or transpose op: {}",
            self.name()
        )))
    }

    /// Transpose of this operation.
    fn transpose(&self) -> CircuitResult<OpRef> {
        Err(CircuitError::unsupported(format!(
            "Cannot dagger or transpose op: {}",
            self.name()
        )))
    }

    /// Structural equality with another operation.
    fn is_equal(&self, other: &dyn Operation) -> bool {
        self.name() == other.name()
            && self.signature() == other.signature()
            && self.params() == other.params()
    }

    /// Free symbols of all parameters.
    fn free_symbols(&self) -> BTreeSet<String> {
        self.params()
            .iter()
            .flat_map(ParameterExpression::free_symbols)
            .collect()
    }

    /// Copy of this operation with symbols replaced, or `None` if nothing
    /// changes.
    fn substitute(&self, _map: &SymbolMap) -> Option<OpRef> {
        None
    }

    /// Downcasting hook for operation-specific handling.
    fn as_any(&self) -> &dyn Any;
}

/// Human-readable form of an operation: name plus parameters.
pub fn op_label(op: &dyn Operation) -> String {
    let params = op.params();
    if params.is_empty() {
        return op.name().to_string();
    }
    let rendered: Vec<String> = params.iter().map(ToString::to_string).collect();
    format!("{}({})", op.name(), rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Opaque;

    impl Operation for Opaque {
        fn name(&self) -> &str {
            "opaque"
        }

        fn signature(&self) -> Signature {
            vec![WireKind::Quantum, WireKind::Classical]
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_default_capabilities() {
        let op = Opaque;
        assert!(matches!(op.dagger(), Err(CircuitError::Unsupported(_))));
        assert!(op.transpose().is_err());
        assert!(op.free_symbols().is_empty());
        assert!(op.is_equal(&Opaque));
        assert_eq!(op_label(&op), "opaque");
    }

    #[test]
    fn test_wire_kinds() {
        assert!(WireKind::Quantum.is_linear());
        assert!(!WireKind::Boolean.is_linear());
        assert_eq!(WireKind::Boolean.unit_kind(), UnitKind::Bit);
        assert_eq!(WireKind::Rng.unit_kind(), UnitKind::RngState);
    }
}

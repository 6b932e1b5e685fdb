//! Built-in unitary gates.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

use crate::error::CircuitResult;
use crate::op::{OpRef, Operation, Signature, WireKind};
use crate::parameter::{ParameterExpression, SymbolMap};

/// Standard gates with known dagger and transpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,
    /// Controlled rotation around Z.
    CRz(ParameterExpression),
    /// Toffoli gate (CCX).
    CCX,
}

impl StandardGate {
    /// Number of qubits the gate acts on.
    pub fn num_qubits(&self) -> usize {
        match self {
            StandardGate::CX | StandardGate::CZ | StandardGate::Swap | StandardGate::CRz(_) => 2,
            StandardGate::CCX => 3,
            _ => 1,
        }
    }

    /// Wrap into a shared operation handle.
    pub fn into_op(self) -> OpRef {
        Arc::new(self)
    }

    fn map_angle(&self, f: impl Fn(&ParameterExpression) -> ParameterExpression) -> Self {
        match self {
            StandardGate::Rx(a) => StandardGate::Rx(f(a)),
            StandardGate::Ry(a) => StandardGate::Ry(f(a)),
            StandardGate::Rz(a) => StandardGate::Rz(f(a)),
            StandardGate::CRz(a) => StandardGate::CRz(f(a)),
            other => other.clone(),
        }
    }
}

impl Operation for StandardGate {
    fn name(&self) -> &str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::CX => "cx",
            StandardGate::CZ => "cz",
            StandardGate::Swap => "swap",
            StandardGate::CRz(_) => "crz",
            StandardGate::CCX => "ccx",
        }
    }

    fn signature(&self) -> Signature {
        vec![WireKind::Quantum; self.num_qubits()]
    }

    fn params(&self) -> Vec<ParameterExpression> {
        match self {
            StandardGate::Rx(a)
            | StandardGate::Ry(a)
            | StandardGate::Rz(a)
            | StandardGate::CRz(a) => vec![a.clone()],
            _ => Vec::new(),
        }
    }

    fn dagger(&self) -> CircuitResult<OpRef> {
        let inverse = match self {
            StandardGate::S => StandardGate::Sdg,
            StandardGate::Sdg => StandardGate::S,
            StandardGate::T => StandardGate::Tdg,
            StandardGate::Tdg => StandardGate::T,
            StandardGate::SX => StandardGate::SXdg,
            StandardGate::SXdg => StandardGate::SX,
            other => other.map_angle(|a| -a.clone()),
        };
        Ok(inverse.into_op())
    }

    fn transpose(&self) -> CircuitResult<OpRef> {
        // Only Ry has an antisymmetric off-diagonal part among these gates.
        let transposed = match self {
            StandardGate::Ry(a) => StandardGate::Ry(-a.clone()),
            other => other.clone(),
        };
        Ok(transposed.into_op())
    }

    fn substitute(&self, map: &SymbolMap) -> Option<OpRef> {
        if self.params().iter().all(|p| !p.is_symbolic()) {
            return None;
        }
        Some(self.map_angle(|a| a.substitute(map).simplify()).into_op())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

//! Non-gate operations the rewriting core relies on.

use std::any::Any;
use std::sync::Arc;

use crate::error::{CircuitError, CircuitResult};
use crate::op::{OpRef, Operation, Signature, WireKind, op_label};
use crate::parameter::{ParameterExpression, SymbolMap};

/// Measure a qubit into a classical bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measure;

impl Operation for Measure {
    fn name(&self) -> &str {
        "measure"
    }

    fn signature(&self) -> Signature {
        vec![WireKind::Quantum, WireKind::Classical]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Reset a qubit to |0⟩.
///
/// Inserted by the core wherever a wire joins an input that expects a
/// freshly created qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reset;

impl Operation for Reset {
    fn name(&self) -> &str {
        "reset"
    }

    fn signature(&self) -> Signature {
        vec![WireKind::Quantum]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Scheduling barrier over arbitrary wires.
///
/// A barrier commutes with reversal, so it survives dagger and transpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barrier {
    signature: Signature,
}

impl Barrier {
    /// A barrier over the given wires.
    pub fn new(signature: Signature) -> Self {
        Self { signature }
    }

    /// A barrier over `n` qubits.
    pub fn qubits(n: usize) -> Self {
        Self::new(vec![WireKind::Quantum; n])
    }
}

impl Operation for Barrier {
    fn name(&self) -> &str {
        "barrier"
    }

    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn dagger(&self) -> CircuitResult<OpRef> {
        Ok(Arc::new(self.clone()))
    }

    fn transpose(&self) -> CircuitResult<OpRef> {
        Ok(Arc::new(self.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Global phase as an explicit, port-less operation.
///
/// Only needed where a phase has to be conditioned on classical bits.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase(pub ParameterExpression);

impl Operation for Phase {
    fn name(&self) -> &str {
        "phase"
    }

    fn signature(&self) -> Signature {
        Vec::new()
    }

    fn params(&self) -> Vec<ParameterExpression> {
        vec![self.0.clone()]
    }

    fn dagger(&self) -> CircuitResult<OpRef> {
        Ok(Arc::new(Phase(-self.0.clone())))
    }

    fn transpose(&self) -> CircuitResult<OpRef> {
        Ok(Arc::new(self.clone()))
    }

    fn substitute(&self, map: &SymbolMap) -> Option<OpRef> {
        self.0
            .is_symbolic()
            .then(|| Arc::new(Phase(self.0.substitute(map).simplify())) as OpRef)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An operation applied only when `width` condition bits read `value`
/// (little-endian).
///
/// The condition bits come first in the signature as Boolean reads,
/// followed by the wrapped operation's own ports.
#[derive(Debug, Clone)]
pub struct Conditional {
    op: OpRef,
    width: usize,
    value: u64,
}

impl Conditional {
    /// Wrap `op` in a condition on `width` bits.
    pub fn new(op: OpRef, width: usize, value: u64) -> CircuitResult<Self> {
        if width < 64 && value >> width != 0 {
            return Err(CircuitError::invalid(format!(
                "Condition value {value} does not fit in {width} bits"
            )));
        }
        Ok(Self { op, width, value })
    }

    /// The wrapped operation.
    pub fn op(&self) -> &OpRef {
        &self.op
    }

    /// Number of condition bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Required value of the condition bits.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Peel nested conditions into `(width, value)` layers, outermost first,
    /// and return the innermost unconditional operation.
    pub fn unwind(&self) -> (Vec<(usize, u64)>, OpRef) {
        let mut layers = vec![(self.width, self.value)];
        let mut inner = self.op.clone();
        loop {
            let next = match inner.as_any().downcast_ref::<Conditional>() {
                Some(cond) => {
                    layers.push((cond.width, cond.value));
                    cond.op.clone()
                }
                None => break,
            };
            inner = next;
        }
        (layers, inner)
    }
}

impl Operation for Conditional {
    fn name(&self) -> &str {
        "conditional"
    }

    fn signature(&self) -> Signature {
        let mut sig = vec![WireKind::Boolean; self.width];
        sig.extend(self.op.signature());
        sig
    }

    fn params(&self) -> Vec<ParameterExpression> {
        self.op.params()
    }

    fn is_equal(&self, other: &dyn Operation) -> bool {
        other
            .as_any()
            .downcast_ref::<Conditional>()
            .is_some_and(|o| {
                o.width == self.width && o.value == self.value && o.op.is_equal(self.op.as_ref())
            })
    }

    fn substitute(&self, map: &SymbolMap) -> Option<OpRef> {
        let op = self.op.substitute(map)?;
        Some(Arc::new(Conditional {
            op,
            width: self.width,
            value: self.value,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Whether `op` is a measurement.
pub fn is_measure(op: &dyn Operation) -> bool {
    op.as_any().is::<Measure>()
}

/// Whether `op` is a barrier.
pub fn is_barrier(op: &dyn Operation) -> bool {
    op.as_any().is::<Barrier>()
}

/// Whether `op` is a reset.
pub fn is_reset(op: &dyn Operation) -> bool {
    op.as_any().is::<Reset>()
}

/// `op` as a conditional, if it is one.
pub fn as_conditional(op: &dyn Operation) -> Option<&Conditional> {
    op.as_any().downcast_ref::<Conditional>()
}

/// Label used when printing a conditional command.
pub(crate) fn conditional_label(cond: &Conditional) -> String {
    format!(
        "IF (width {} == {}) THEN {}",
        cond.width,
        cond.value,
        op_label(cond.op.as_ref())
    )
}

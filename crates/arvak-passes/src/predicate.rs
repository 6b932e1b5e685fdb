//! The predicate capability trait.
//!
//! A predicate is an immutable boolean check over a [`Circuit`] with a small
//! algebra on top: `implies` lets a pass trust a cached, stronger fact instead
//! of re-verifying, and `meet` folds two requirements of the same kind into
//! one when passes are sequenced. Both are only defined between predicates of
//! the same [`PredicateKind`].

use serde_json::{Value, json};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arvak_circuit::Circuit;

use crate::error::{CompileError, CompileResult};

/// Name of a concrete predicate type.
///
/// Pass contracts and the compilation cache are keyed by kind, so at most one
/// predicate of each kind appears in any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PredicateKind(&'static str);

impl PredicateKind {
    /// A kind with the given type name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The type name.
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A checkable boolean property of a circuit.
pub trait Predicate: fmt::Debug + Send + Sync + Any {
    /// The concrete kind of this predicate.
    fn kind(&self) -> PredicateKind;

    /// Check the predicate against a circuit.
    fn verify(&self, circuit: &Circuit) -> bool;

    /// Whether this predicate being true guarantees `other` is true.
    ///
    /// Fails with [`CompileError::IncorrectPredicate`] if `other` has a
    /// different kind.
    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool>;

    /// The weakest predicate of this kind implying both `self` and `other`.
    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr>;

    /// Human-readable form, e.g. `MaxNQubitsPredicate(5)`.
    fn description(&self) -> String {
        self.kind().name().to_string()
    }

    /// Serialized form: `{"type": <kind>, ...params}`.
    fn to_json(&self) -> CompileResult<Value> {
        Ok(json!({ "type": self.kind().name() }))
    }

    /// Downcasting hook for same-kind comparisons.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a predicate.
pub type PredicatePtr = Arc<dyn Predicate>;

/// Predicates keyed by kind.
pub type PredicateMap = BTreeMap<PredicateKind, PredicatePtr>;

/// Build a kind-keyed map, later entries replacing earlier ones of the same
/// kind.
pub fn predicate_map(predicates: impl IntoIterator<Item = PredicatePtr>) -> PredicateMap {
    predicates.into_iter().map(|p| (p.kind(), p)).collect()
}

/// Downcast `other` to the concrete type `T`, or fail with the cross-kind
/// error.
pub(crate) fn same_kind<T: Predicate>(other: &dyn Predicate) -> CompileResult<&T> {
    other.as_any().downcast_ref::<T>().ok_or_else(|| {
        CompileError::IncorrectPredicate(
            "Cannot compare predicates of different subclasses".to_string(),
        )
    })
}

/// Implication for parameterless predicates: any two instances are equal.
pub(crate) fn trivial_implies<T: Predicate>(other: &dyn Predicate) -> CompileResult<bool> {
    same_kind::<T>(other).map(|_| true)
}

/// Meet for parameterless predicates.
pub(crate) fn trivial_meet<T: Predicate + Default>(
    other: &dyn Predicate,
) -> CompileResult<PredicatePtr> {
    same_kind::<T>(other)?;
    Ok(Arc::new(T::default()))
}

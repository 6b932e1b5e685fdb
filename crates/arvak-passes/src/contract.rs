//! Pass contracts and their composition.
//!
//! Every pass carries [`PassConditions`]: the predicates it requires and the
//! [`PostConditions`] it promises. [`match_passes`] combines the contracts of
//! two passes run back to back into the contract of the pair, rejecting
//! pairs where the first pass provably breaks a requirement of the second.
//! Nothing here looks at a circuit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{CompileError, CompileResult};
use crate::predicate::{PredicateKind, PredicateMap, PredicatePtr};

/// What a pass promises about one predicate kind after it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Guarantee {
    /// The predicate may no longer hold.
    Clear,
    /// If the predicate held before, it still holds.
    Preserve,
}

impl fmt::Display for Guarantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guarantee::Clear => f.write_str("Clear"),
            Guarantee::Preserve => f.write_str("Preserve"),
        }
    }
}

/// Guarantees keyed by predicate kind.
pub type GuaranteeMap = BTreeMap<PredicateKind, Guarantee>;

/// What holds after a pass runs.
#[derive(Debug, Clone)]
pub struct PostConditions {
    /// Predicates that are true afterwards.
    pub specific: PredicateMap,
    /// Per-kind guarantees for everything else.
    pub generic: GuaranteeMap,
    /// Guarantee for kinds in neither map.
    pub default: Guarantee,
}

impl PostConditions {
    /// Promise nothing: every predicate is cleared.
    pub fn new() -> Self {
        Self {
            specific: PredicateMap::new(),
            generic: GuaranteeMap::new(),
            default: Guarantee::Clear,
        }
    }

    /// Preserve every predicate.
    pub fn preserve_all() -> Self {
        Self::new().with_default(Guarantee::Preserve)
    }

    /// Add a predicate that holds afterwards.
    #[must_use]
    pub fn with_specific(mut self, predicate: PredicatePtr) -> Self {
        self.specific.insert(predicate.kind(), predicate);
        self
    }

    /// Set the guarantee for one kind.
    #[must_use]
    pub fn with_generic(mut self, kind: PredicateKind, guarantee: Guarantee) -> Self {
        self.generic.insert(kind, guarantee);
        self
    }

    /// Set the default guarantee.
    #[must_use]
    pub fn with_default(mut self, guarantee: Guarantee) -> Self {
        self.default = guarantee;
        self
    }

    /// The guarantee resolved for `kind`: the generic entry, else the
    /// default.
    pub fn guarantee(&self, kind: PredicateKind) -> Guarantee {
        self.generic.get(&kind).copied().unwrap_or(self.default)
    }
}

impl Default for PostConditions {
    fn default() -> Self {
        Self::new()
    }
}

/// Preconditions and postconditions of a pass.
#[derive(Debug, Clone, Default)]
pub struct PassConditions {
    /// Predicates required before the pass runs.
    pub preconditions: PredicateMap,
    /// What holds after the pass runs.
    pub postconditions: PostConditions,
}

impl PassConditions {
    pub fn new(preconditions: PredicateMap, postconditions: PostConditions) -> Self {
        Self {
            preconditions,
            postconditions,
        }
    }
}

impl fmt::Display for PassConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Preconditions:")?;
        for pred in self.preconditions.values() {
            writeln!(f, "  {}", pred.description())?;
        }
        writeln!(f, "Specific Postconditions:")?;
        for pred in self.postconditions.specific.values() {
            writeln!(f, "  {}", pred.description())?;
        }
        writeln!(f, "Generic Postconditions:")?;
        for (kind, guarantee) in &self.postconditions.generic {
            writeln!(f, "  {kind} {guarantee}")?;
        }
        writeln!(f, "Default Postcondition: {}", self.postconditions.default)
    }
}

/// Guarantees of `rhs` adjusted for what `lhs` did before it: a Preserve
/// only survives if `lhs` also preserves the kind.
fn match_class_guarantees(lhs: &PostConditions, rhs: &PostConditions) -> GuaranteeMap {
    rhs.generic
        .iter()
        .map(|(kind, guarantee)| {
            let combined = match guarantee {
                Guarantee::Preserve => lhs.guarantee(*kind),
                Guarantee::Clear => Guarantee::Clear,
            };
            (*kind, combined)
        })
        .collect()
}

/// Contract of running `lhs` then `rhs`.
///
/// Each precondition of `rhs` is dropped when a specific postcondition of
/// `lhs` implies it, and otherwise joins the combined preconditions, met
/// with any existing requirement of the same kind. With `strict` set, a
/// requirement that `lhs` clears, or contradicts with a specific
/// postcondition that does not imply it, fails with
/// [`CompileError::IncompatiblePasses`].
pub fn match_passes(
    lhs: &PassConditions,
    rhs: &PassConditions,
    strict: bool,
) -> CompileResult<PassConditions> {
    let lhs_post = &lhs.postconditions;
    let rhs_post = &rhs.postconditions;

    let mut preconditions = lhs.preconditions.clone();
    for (kind, required) in &rhs.preconditions {
        if let Some(provided) = lhs_post.specific.get(kind) {
            if !provided.implies(required.as_ref())? && strict {
                return Err(CompileError::incompatible(kind));
            }
            continue;
        }
        if strict && lhs_post.guarantee(*kind) == Guarantee::Clear {
            return Err(CompileError::incompatible(kind));
        }
        let merged = match preconditions.get(kind) {
            Some(existing) => existing.meet(required.as_ref())?,
            None => Arc::clone(required),
        };
        preconditions.insert(merged.kind(), merged);
    }

    let mut specific = rhs_post.specific.clone();
    for (kind, pred) in &lhs_post.specific {
        if !specific.contains_key(kind) && rhs_post.guarantee(*kind) == Guarantee::Preserve {
            specific.insert(*kind, Arc::clone(pred));
        }
    }

    let mut generic = match_class_guarantees(lhs_post, rhs_post);
    for (kind, guarantee) in match_class_guarantees(rhs_post, lhs_post) {
        generic.entry(kind).or_insert(guarantee);
    }

    let default = match rhs_post.default {
        Guarantee::Clear => Guarantee::Clear,
        Guarantee::Preserve => lhs_post.default,
    };

    Ok(PassConditions::new(
        preconditions,
        PostConditions {
            specific,
            generic,
            default,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::predicate_map;
    use crate::predicates::{
        GateSetPredicate, MaxNQubitsPredicate, NoBarriersPredicate, NoSymbolsPredicate,
    };

    fn requires(preds: impl IntoIterator<Item = PredicatePtr>) -> PassConditions {
        PassConditions::new(predicate_map(preds), PostConditions::preserve_all())
    }

    #[test]
    fn test_preserve_passes_requirement_through() {
        let a = requires([Arc::new(NoSymbolsPredicate) as PredicatePtr]);
        let b = requires([Arc::new(NoBarriersPredicate) as PredicatePtr]);
        let ab = match_passes(&a, &b, true).unwrap();
        assert_eq!(ab.preconditions.len(), 2);
        assert_eq!(ab.postconditions.default, Guarantee::Preserve);
    }

    #[test]
    fn test_specific_postcondition_satisfies() {
        let a = PassConditions::new(
            PredicateMap::new(),
            PostConditions::new().with_specific(Arc::new(GateSetPredicate::new(["cx"]))),
        );
        let b = requires([Arc::new(GateSetPredicate::new(["cx", "h"])) as PredicatePtr]);
        let ab = match_passes(&a, &b, true).unwrap();
        assert!(ab.preconditions.is_empty());
        // b preserves everything, so a's postcondition carries forward
        assert!(ab.postconditions.specific.contains_key(&GateSetPredicate::KIND));
    }

    #[test]
    fn test_specific_postcondition_too_weak() {
        let a = PassConditions::new(
            PredicateMap::new(),
            PostConditions::preserve_all().with_specific(Arc::new(MaxNQubitsPredicate(5))),
        );
        let b = requires([Arc::new(MaxNQubitsPredicate(3)) as PredicatePtr]);
        let err = match_passes(&a, &b, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot compose these passes due to mismatching predicates of type: MaxNQubitsPredicate"
        );
        let lenient = match_passes(&a, &b, false).unwrap();
        assert!(lenient.preconditions.is_empty());
    }

    #[test]
    fn test_cleared_requirement() {
        let a = PassConditions::new(
            PredicateMap::new(),
            PostConditions::preserve_all()
                .with_generic(NoBarriersPredicate::KIND, Guarantee::Clear),
        );
        let b = requires([Arc::new(NoBarriersPredicate) as PredicatePtr]);
        assert!(matches!(
            match_passes(&a, &b, true),
            Err(CompileError::IncompatiblePasses { .. })
        ));
        let lenient = match_passes(&a, &b, false).unwrap();
        assert!(lenient.preconditions.contains_key(&NoBarriersPredicate::KIND));
        assert_eq!(
            lenient.postconditions.guarantee(NoBarriersPredicate::KIND),
            Guarantee::Clear
        );
    }

    #[test]
    fn test_requirements_meet() {
        let a = requires([Arc::new(MaxNQubitsPredicate(5)) as PredicatePtr]);
        let b = requires([Arc::new(MaxNQubitsPredicate(3)) as PredicatePtr]);
        let ab = match_passes(&a, &b, true).unwrap();
        assert_eq!(
            ab.preconditions[&MaxNQubitsPredicate::KIND].description(),
            "MaxNQubitsPredicate(3)"
        );
    }

    #[test]
    fn test_cleared_specific_dropped() {
        let a = PassConditions::new(
            PredicateMap::new(),
            PostConditions::preserve_all().with_specific(Arc::new(NoBarriersPredicate)),
        );
        let b = PassConditions::new(PredicateMap::new(), PostConditions::new());
        let ab = match_passes(&a, &b, true).unwrap();
        assert!(ab.postconditions.specific.is_empty());
        assert_eq!(ab.postconditions.default, Guarantee::Clear);
    }

    #[test]
    fn test_generic_guarantees_combine() {
        let a = PassConditions::new(
            PredicateMap::new(),
            PostConditions::new()
                .with_generic(NoSymbolsPredicate::KIND, Guarantee::Preserve)
                .with_generic(NoBarriersPredicate::KIND, Guarantee::Preserve),
        );
        let b = PassConditions::new(
            PredicateMap::new(),
            PostConditions::preserve_all()
                .with_generic(NoBarriersPredicate::KIND, Guarantee::Clear),
        );
        let ab = match_passes(&a, &b, true).unwrap();
        let generic = &ab.postconditions.generic;
        assert_eq!(generic[&NoSymbolsPredicate::KIND], Guarantee::Preserve);
        assert_eq!(generic[&NoBarriersPredicate::KIND], Guarantee::Clear);
        assert_eq!(ab.postconditions.default, Guarantee::Clear);
    }

    #[test]
    fn test_display() {
        let conditions = PassConditions::new(
            predicate_map([Arc::new(MaxNQubitsPredicate(2)) as PredicatePtr]),
            PostConditions::preserve_all()
                .with_specific(Arc::new(NoBarriersPredicate))
                .with_generic(GateSetPredicate::KIND, Guarantee::Clear),
        );
        assert_eq!(
            conditions.to_string(),
            "Preconditions:\n  MaxNQubitsPredicate(2)\nSpecific Postconditions:\n  \
             NoBarriersPredicate\nGeneric Postconditions:\n  GateSetPredicate Clear\n\
             Default Postcondition: Preserve\n"
        );
    }
}

//! Integration tests for pass contracts and their composition.
//!
//! Covers the end-to-end scenarios on real circuits and checks algebraic
//! properties of `match_passes` exhaustively over a small contract universe
//! and with generated contracts.

use std::sync::Arc;

use arvak_circuit::Circuit;
use arvak_passes::{
    CompilationUnit, CompileError, GateSetPredicate, Guarantee, MaxNQubitsPredicate,
    NoBarriersPredicate, Pass, PassConditions, PassPtr, PostConditions, PredicateMap,
    PredicatePtr, RepeatPass, SequencePass, StandardPass, match_passes, predicate_map,
};
use proptest::prelude::*;

fn noop(name: &str) -> StandardPass {
    StandardPass::new(name, |_, _| Ok(false))
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_gate_set_precondition_on_single_cx() {
    let mut circuit = Circuit::with_units(2, 0);
    circuit.cx(0, 1).unwrap();
    let gate_set: PredicatePtr = Arc::new(GateSetPredicate::new(["cx"]));
    let mut cu = CompilationUnit::with_targets(circuit, [gate_set.clone()]);
    assert!(cu.check_all_predicates());

    let pass = noop("Noop")
        .with_precondition(gate_set)
        .with_postconditions(PostConditions::preserve_all());
    assert!(!pass.apply(&mut cu).unwrap());
    assert!(cu.check_all_predicates());
}

#[test]
fn test_preserved_requirement_is_discharged() {
    // A pins the predicate and preserves its kind, so B's requirement is met
    let a = noop("A").with_postconditions(
        PostConditions::new()
            .with_specific(Arc::new(NoBarriersPredicate))
            .with_generic(NoBarriersPredicate::KIND, Guarantee::Preserve),
    );
    let b = noop("B").with_precondition(Arc::new(NoBarriersPredicate));
    let ab = match_passes(a.conditions(), b.conditions(), true).unwrap();
    assert!(!ab.preconditions.contains_key(&NoBarriersPredicate::KIND));
}

#[test]
fn test_cleared_requirement_rejected() {
    let a: PassPtr = Arc::new(noop("A").with_postconditions(
        PostConditions::preserve_all().with_generic(NoBarriersPredicate::KIND, Guarantee::Clear),
    ));
    let b: PassPtr = Arc::new(noop("B").with_precondition(Arc::new(NoBarriersPredicate)));
    let err = SequencePass::new(vec![a, b]).unwrap_err();
    assert!(matches!(
        err,
        CompileError::IncompatiblePasses { ref kind } if kind == "NoBarriersPredicate"
    ));
}

#[test]
fn test_runtime_failure_after_lenient_composition() {
    let mut circuit = Circuit::with_units(2, 0);
    circuit.h(0).unwrap();
    let add_barrier: PassPtr = Arc::new(
        StandardPass::new("AddBarrier", |circuit, _| {
            circuit.barrier(&[0, 1])?;
            Ok(true)
        })
        .with_postconditions(
            PostConditions::preserve_all()
                .with_generic(NoBarriersPredicate::KIND, Guarantee::Clear),
        ),
    );
    let needs: PassPtr = Arc::new(noop("Needs").with_precondition(Arc::new(NoBarriersPredicate)));
    let seq = SequencePass::with_strict(vec![add_barrier, needs], false).unwrap();

    let mut cu = CompilationUnit::new(circuit);
    let err = seq.apply(&mut cu).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Predicate requirements are not satisfied: NoBarriersPredicate"
    );
}

// ============================================================================
// Associativity
// ============================================================================

fn universe() -> Vec<PassConditions> {
    let pres: Vec<PredicateMap> = vec![
        PredicateMap::new(),
        predicate_map([Arc::new(NoBarriersPredicate) as PredicatePtr]),
        predicate_map([Arc::new(MaxNQubitsPredicate(2)) as PredicatePtr]),
    ];
    let specifics: Vec<Option<PredicatePtr>> = vec![
        None,
        Some(Arc::new(NoBarriersPredicate)),
        Some(Arc::new(MaxNQubitsPredicate(1))),
    ];
    let generics = [
        None,
        Some((NoBarriersPredicate::KIND, Guarantee::Clear)),
        Some((MaxNQubitsPredicate::KIND, Guarantee::Preserve)),
    ];
    let mut out = Vec::new();
    for pre in &pres {
        for specific in &specifics {
            for generic in &generics {
                for default in [Guarantee::Clear, Guarantee::Preserve] {
                    let mut post = PostConditions::new().with_default(default);
                    if let Some(p) = specific {
                        post = post.with_specific(p.clone());
                    }
                    if let Some((kind, g)) = generic {
                        post = post.with_generic(*kind, *g);
                    }
                    out.push(PassConditions::new(pre.clone(), post));
                }
            }
        }
    }
    out
}

/// Rendered contract, or `None` if composition is rejected.
fn compose3(
    a: &PassConditions,
    b: &PassConditions,
    c: &PassConditions,
    left_first: bool,
    strict: bool,
) -> Option<String> {
    let result = if left_first {
        match_passes(a, b, strict).and_then(|ab| match_passes(&ab, c, strict))
    } else {
        match_passes(b, c, strict).and_then(|bc| match_passes(a, &bc, strict))
    };
    result.ok().map(|abc| abc.to_string())
}

#[test]
fn test_strict_composition_is_associative() {
    let contracts = universe();
    for a in &contracts {
        for b in &contracts {
            for c in &contracts {
                let left = compose3(a, b, c, true, true);
                let right = compose3(a, b, c, false, true);
                assert_eq!(left, right, "\nA:\n{a}B:\n{b}C:\n{c}");
            }
        }
    }
}

#[test]
fn test_lenient_composition_is_not_associative() {
    // A pins the predicate, B clears everything, C requires it
    let a = PassConditions::new(
        PredicateMap::new(),
        PostConditions::new().with_specific(Arc::new(NoBarriersPredicate)),
    );
    let b = PassConditions::default();
    let c = PassConditions::new(
        predicate_map([Arc::new(NoBarriersPredicate) as PredicatePtr]),
        PostConditions::new(),
    );
    let left = compose3(&a, &b, &c, true, false).unwrap();
    let right = compose3(&a, &b, &c, false, false).unwrap();
    assert!(left.contains("Preconditions:\n  NoBarriersPredicate\n"));
    assert!(right.starts_with("Preconditions:\nSpecific Postconditions:\n"));
    assert!(compose3(&a, &b, &c, true, true).is_none());
}

// ============================================================================
// Self-composition
// ============================================================================

/// A pass requiring `MaxNQubits(required)` (and optionally no barriers) whose
/// specific postconditions re-establish everything it requires.
fn self_sufficient(
    required: usize,
    slack: usize,
    needs_no_barriers: bool,
    clear_gate_set: bool,
    default: Guarantee,
) -> StandardPass {
    let mut post = PostConditions::new()
        .with_default(default)
        .with_specific(Arc::new(MaxNQubitsPredicate(required.saturating_sub(slack))));
    let mut pass =
        noop("SelfSufficient").with_precondition(Arc::new(MaxNQubitsPredicate(required)));
    if needs_no_barriers {
        pass = pass.with_precondition(Arc::new(NoBarriersPredicate));
        post = post.with_specific(Arc::new(NoBarriersPredicate));
    }
    if clear_gate_set {
        post = post.with_generic(GateSetPredicate::KIND, Guarantee::Clear);
    }
    pass.with_postconditions(post)
}

proptest! {
    #[test]
    fn prop_self_sufficient_passes_compose_with_themselves(
        required in 0usize..8,
        slack in 0usize..4,
        needs_no_barriers in any::<bool>(),
        clear_gate_set in any::<bool>(),
        preserve in any::<bool>(),
    ) {
        let default = if preserve { Guarantee::Preserve } else { Guarantee::Clear };
        let pass = self_sufficient(required, slack, needs_no_barriers, clear_gate_set, default);
        let twice = match_passes(pass.conditions(), pass.conditions(), true);
        prop_assert!(twice.is_ok());
        let twice = twice.unwrap();
        prop_assert_eq!(twice.preconditions.len(), pass.preconditions().len());
        prop_assert!(RepeatPass::new(Arc::new(pass)).is_ok());
    }
}

//! End-to-end pipeline tests: managers, serialized pass trees and the
//! predicate cache across several passes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use arvak_circuit::{Circuit, UnitId, UnitKind};
use arvak_passes::{
    Callbacks, CompilationUnit, ConnectivityPredicate, CouplingMap, DefaultRegisterPredicate,
    MaxNQubitsPredicate, NoBarriersPredicate, Pass, PassManagerBuilder, PassPtr, PassRegistry,
    PostConditions, PredicatePtr, RepeatPass, RepeatUntilSatisfiedPass, RepeatWithMetricPass,
    SafetyMode, SequencePass, StandardPass, UserDefinedPredicate, flatten_registers,
    remove_barriers, remove_blank_wires, rename_qubits,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Three qubits in a named register, with a barrier and an idle wire.
fn messy_circuit() -> Circuit {
    let mut circuit = Circuit::new();
    for i in 0..3 {
        circuit
            .add_qubit(UnitId::new(UnitKind::Qubit, "data", [i]))
            .unwrap();
    }
    let d = |i: u32| UnitId::new(UnitKind::Qubit, "data", [i]);
    let h = arvak_circuit::StandardGate::H.into_op();
    let cx = arvak_circuit::StandardGate::CX.into_op();
    circuit.apply(h, &[d(0)]).unwrap();
    circuit
        .apply(Arc::new(arvak_circuit::Barrier::qubits(2)), &[d(0), d(2)])
        .unwrap();
    circuit.apply(cx, &[d(0), d(2)]).unwrap();
    circuit
}

#[test]
fn test_structural_pipeline() {
    init_tracing();
    let targets: [PredicatePtr; 3] = [
        Arc::new(NoBarriersPredicate),
        Arc::new(DefaultRegisterPredicate),
        Arc::new(MaxNQubitsPredicate(2)),
    ];
    let mut cu = CompilationUnit::with_targets(messy_circuit(), targets);
    assert!(!cu.check_all_predicates());

    let pm = PassManagerBuilder::new()
        .with_pass(remove_barriers())
        .with_pass(remove_blank_wires())
        .with_pass(flatten_registers())
        .with_safety_mode(SafetyMode::Audit)
        .build()
        .unwrap();
    assert!(pm.run(&mut cu).unwrap());
    assert!(cu.check_all_predicates());

    let data = |i: u32| UnitId::new(UnitKind::Qubit, "data", [i]);
    assert_eq!(
        cu.circuit().to_string(),
        "h q[0];\ncx q[0], q[1];\nglobal phase: 0"
    );
    assert_eq!(cu.final_map().get_right(&data(2)), Some(&UnitId::qubit(1)));
    assert_eq!(cu.final_map().get_right(&data(1)), None);
    assert_eq!(cu.final_map().len(), 2);
}

#[test]
fn test_placement_then_connectivity() {
    init_tracing();
    let mut circuit = Circuit::with_units(3, 0);
    circuit.cx(0, 2).unwrap();
    let connectivity: PredicatePtr = Arc::new(ConnectivityPredicate::new(CouplingMap::linear(3)));
    let mut cu = CompilationUnit::with_targets(circuit, [connectivity.clone()]);
    assert!(!cu.check_all_predicates());

    // q[0] and q[2] land on adjacent nodes
    let placement = BTreeMap::from([
        (UnitId::qubit(0), UnitId::node(0)),
        (UnitId::qubit(1), UnitId::node(2)),
        (UnitId::qubit(2), UnitId::node(1)),
    ]);
    let check: PassPtr = Arc::new(
        StandardPass::new("CheckConnectivity", |_, _| Ok(false))
            .with_precondition(connectivity)
            .with_postconditions(PostConditions::preserve_all()),
    );
    // Renaming clears connectivity, so the check only composes leniently
    let steps: Vec<PassPtr> = vec![Arc::new(rename_qubits(placement).unwrap()), check];
    assert!(SequencePass::new(steps.clone()).is_err());
    let pipeline = SequencePass::with_strict(steps, false).unwrap();
    assert!(pipeline.apply(&mut cu).unwrap());
    assert!(cu.check_all_predicates());
    assert_eq!(
        cu.initial_map().get_right(&UnitId::qubit(1)),
        Some(&UnitId::node(2))
    );
}

#[test]
fn test_pass_tree_json_roundtrip() {
    let shrink: PassPtr = Arc::new(remove_barriers());
    let tree = SequencePass::new(vec![
        Arc::new(flatten_registers()),
        Arc::new(RepeatPass::new(shrink.clone()).unwrap()),
        Arc::new(
            RepeatUntilSatisfiedPass::new(shrink.clone(), Arc::new(NoBarriersPredicate)).unwrap(),
        ),
        Arc::new(RepeatWithMetricPass::new(shrink, "n_ops", Circuit::n_ops).unwrap()),
        Arc::new(rename_qubits(BTreeMap::from([(UnitId::qubit(0), UnitId::node(4))])).unwrap()),
    ])
    .unwrap();
    let config = tree.config();

    let registry = PassRegistry::default();
    let rebuilt = registry.pass_from_json(&config).unwrap();
    assert_eq!(rebuilt.config(), config);
    assert_eq!(rebuilt.conditions().to_string(), tree.conditions().to_string());

    let text = serde_json::to_string(&config).unwrap();
    let reparsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(registry.pass_from_json(&reparsed).unwrap().config(), config);
}

#[test]
fn test_user_defined_predicate_is_not_serializable() {
    let body: PassPtr = Arc::new(remove_barriers());
    let pass =
        RepeatUntilSatisfiedPass::new(body, Arc::new(UserDefinedPredicate::new(|_| true))).unwrap();
    let err = PassRegistry::default()
        .pass_from_json(&pass.config())
        .unwrap_err();
    assert!(err.to_string().starts_with("Invalid pass configuration"));
}

#[test]
fn test_callbacks_see_every_pass() {
    init_tracing();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callbacks = Callbacks::new().with_before(move |cu, cfg| {
        let class = cfg["pass_class"].as_str().unwrap_or_default();
        sink.lock()
            .unwrap()
            .push(format!("{class}:{}", cu.circuit().n_ops()));
    });
    let pm = PassManagerBuilder::new()
        .with_pass(RepeatPass::new(Arc::new(remove_barriers())).unwrap())
        .with_callbacks(callbacks)
        .build()
        .unwrap();
    let mut cu = CompilationUnit::new(messy_circuit());
    assert!(pm.run(&mut cu).unwrap());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "SequencePass:3",
            "RepeatPass:3",
            "StandardPass:3",
            "StandardPass:2",
        ]
    );
}

//! Integration tests for the rewriting primitives.
//!
//! These exercise substitution, composition and reversal through the public
//! API only, including generated circuits for the algebraic properties.

use std::collections::BTreeSet;
use std::sync::Arc;

use arvak_circuit::builtin::is_reset;
use arvak_circuit::{
    Circuit, CircuitError, Conditional, OpGroupTransfer, ParameterExpression, StandardGate,
    UnitId, Vertex, VertexDeletion,
};
use proptest::prelude::*;

/// Command strings in order.
fn listing(circuit: &Circuit) -> Vec<String> {
    circuit.commands().map(|c| c.to_string()).collect()
}

/// Operation names with their vertex-independent arguments.
fn shape(circuit: &Circuit) -> Vec<(String, Vec<UnitId>)> {
    circuit
        .commands()
        .map(|c| (arvak_circuit::op_label(c.op.as_ref()), c.args))
        .collect()
}

// ============================================================================
// Single-vertex substitution
// ============================================================================

#[test]
fn test_identity_substitution_removes_vertex() {
    let mut circuit = Circuit::with_units(1, 0);
    circuit.h(0).unwrap().x(0).unwrap().z(0).unwrap();
    circuit.add_phase(ParameterExpression::constant(0.125));
    let x = circuit.get_commands()[1].vertex;

    let identity = Circuit::with_units(1, 0);
    circuit
        .substitute_vertex(&identity, x, VertexDeletion::Yes, OpGroupTransfer::Preserve)
        .unwrap();

    assert_eq!(listing(&circuit), vec!["h q[0];", "z q[0];"]);
    assert_eq!(circuit.phase().as_f64(), Some(0.125));
    assert!(!circuit.graph().contains_vertex(x));
    circuit.verify_integrity().unwrap();
}

#[test]
fn test_handles_survive_substitution() {
    let mut circuit = Circuit::with_units(2, 0);
    circuit.h(0).unwrap().cx(0, 1).unwrap().t(1).unwrap();
    let cmds = circuit.get_commands();
    let (h, cx, t) = (cmds[0].vertex, cmds[1].vertex, cmds[2].vertex);

    let mut swap_cx = Circuit::with_units(2, 0);
    swap_cx.h(0).unwrap().h(1).unwrap().cx(1, 0).unwrap();
    swap_cx.h(0).unwrap().h(1).unwrap();
    circuit
        .substitute_vertex(&swap_cx, cx, VertexDeletion::Yes, OpGroupTransfer::Preserve)
        .unwrap();

    assert_eq!(circuit.op_at(h).unwrap().name(), "h");
    assert_eq!(circuit.op_at(t).unwrap().name(), "t");
    assert!(matches!(circuit.op_at(cx), Err(CircuitError::MissingVertex)));
    assert_eq!(circuit.n_ops(), 7);
    circuit.verify_integrity().unwrap();
}

#[test]
fn test_region_substitution() {
    let mut circuit = Circuit::with_units(2, 0);
    circuit.h(0).unwrap().h(0).unwrap().cx(0, 1).unwrap().x(1).unwrap();
    let cmds = circuit.get_commands();
    let region: BTreeSet<Vertex> = [cmds[0].vertex, cmds[1].vertex].into_iter().collect();
    let hole = circuit.subcircuit(&region).unwrap();
    assert_eq!(hole.n_slots(), 1);

    circuit
        .substitute(
            &Circuit::with_units(1, 0),
            &hole,
            VertexDeletion::Yes,
            OpGroupTransfer::Preserve,
        )
        .unwrap();
    assert_eq!(listing(&circuit), vec!["cx q[0], q[1];", "x q[1];"]);
    circuit.verify_integrity().unwrap();
}

#[test]
fn test_batched_region_removal() {
    let mut circuit = Circuit::with_units(1, 0);
    circuit.h(0).unwrap().x(0).unwrap();
    let cmds = circuit.get_commands();
    let region: BTreeSet<Vertex> = cmds.iter().map(|c| c.vertex).collect();
    let hole = circuit.subcircuit(&region).unwrap();

    let mut z = Circuit::with_units(1, 0);
    z.z(0).unwrap();
    circuit
        .substitute(&z, &hole, VertexDeletion::No, OpGroupTransfer::Preserve)
        .unwrap();
    assert_eq!(listing(&circuit), vec!["z q[0];"]);
    for v in &region {
        assert!(circuit.graph().contains_vertex(*v));
        circuit.remove_op(*v).unwrap();
    }
    circuit.verify_integrity().unwrap();
}

#[test]
fn test_non_convex_region_rejected_without_mutation() {
    let mut circuit = Circuit::with_units(2, 0);
    circuit.h(0).unwrap().cx(0, 1).unwrap().z(1).unwrap();
    let before = listing(&circuit);
    let cmds = circuit.get_commands();
    let region: BTreeSet<Vertex> = [cmds[0].vertex, cmds[2].vertex].into_iter().collect();
    assert!(matches!(
        circuit.subcircuit(&region),
        Err(CircuitError::CircuitInvalidity(_))
    ));
    assert_eq!(listing(&circuit), before);
    circuit.verify_integrity().unwrap();
}

#[test]
fn test_classical_read_ordered_before_rewrite_of_writer() {
    let mut circuit = Circuit::with_units(2, 1);
    circuit.x(1).unwrap();
    let cond = Conditional::new(StandardGate::X.into_op(), 1, 1).unwrap();
    circuit
        .add_op(Arc::new(cond), &[UnitId::bit(0), UnitId::qubit(1)], None)
        .unwrap();
    circuit.measure(0, 0).unwrap();
    let cmds = circuit.get_commands();
    let (x, reader, writer) = (cmds[0].vertex, cmds[1].vertex, cmds[2].vertex);

    let hole = circuit.subcircuit(&BTreeSet::from([x])).unwrap();
    let mut hh = Circuit::with_units(1, 0);
    hh.h(0).unwrap().h(0).unwrap();
    circuit
        .substitute(&hh, &hole, VertexDeletion::Yes, OpGroupTransfer::Preserve)
        .unwrap();

    let order: Vec<Vertex> = circuit.commands().map(|c| c.vertex).collect();
    let at = |v: Vertex| order.iter().position(|&u| u == v).unwrap();
    assert!(at(reader) < at(writer));
    let topo = circuit.graph().topological_order().unwrap();
    let topo_at = |v: Vertex| topo.iter().position(|&u| u == v).unwrap();
    assert!(topo_at(reader) < topo_at(writer));
    assert_eq!(
        listing(&circuit).last().map(String::as_str),
        Some("measure q[0], c[0];")
    );
}

// ============================================================================
// Composition joins
// ============================================================================

#[test]
fn test_discard_then_create_inserts_reset() {
    let mut a = Circuit::with_units(1, 0);
    a.h(0).unwrap();
    a.qubit_discard(&UnitId::qubit(0)).unwrap();

    let mut b = Circuit::with_units(1, 0);
    b.qubit_create(&UnitId::qubit(0)).unwrap();
    b.x(0).unwrap();

    let joined = Circuit::sequential(&a, &b).unwrap();
    let cmds = joined.get_commands();
    assert_eq!(cmds.len(), 3);
    assert!(is_reset(cmds[1].op.as_ref()));
    joined.verify_integrity().unwrap();

    let plain = Circuit::with_units(1, 0);
    let err = Circuit::sequential(&a, &plain).unwrap_err();
    assert!(matches!(err, CircuitError::CircuitInvalidity(_)));
}

#[test]
fn test_output_then_create_inserts_reset() {
    let mut a = Circuit::with_units(1, 0);
    a.h(0).unwrap();
    let mut b = Circuit::with_units(1, 0);
    b.qubit_create(&UnitId::qubit(0)).unwrap();
    let joined = Circuit::sequential(&a, &b).unwrap();
    assert_eq!(listing(&joined), vec!["h q[0];", "reset q[0];"]);
}

#[test]
fn test_append_keeps_classical_reads() {
    let mut a = Circuit::with_units(1, 1);
    a.measure(0, 0).unwrap();
    let mut b = Circuit::with_units(1, 1);
    let cond = Conditional::new(StandardGate::X.into_op(), 1, 1).unwrap();
    b.add_op(
        Arc::new(cond),
        &[UnitId::bit(0), UnitId::qubit(0)],
        None,
    )
    .unwrap();
    a.append(&b).unwrap();
    assert_eq!(
        listing(&a),
        vec!["measure q[0], c[0];", "IF (width 1 == 1) THEN x c[0], q[0];"]
    );
    a.verify_integrity().unwrap();
}

// ============================================================================
// Generated properties
// ============================================================================

#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    S(u32),
    T(u32),
    Rz(f64, u32),
    Cx(u32, u32),
}

impl GateOp {
    fn apply(&self, circuit: &mut Circuit) {
        let _ = match *self {
            GateOp::H(q) => circuit.h(q),
            GateOp::S(q) => circuit.s(q),
            GateOp::T(q) => circuit.t(q),
            GateOp::Rz(theta, q) => circuit.rz(theta, q),
            GateOp::Cx(c, t) => circuit.cx(c, t),
        };
    }
}

fn arb_gate(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    let q = 0..num_qubits;
    prop_oneof![
        q.clone().prop_map(GateOp::H),
        q.clone().prop_map(GateOp::S),
        q.clone().prop_map(GateOp::T),
        (-3.0_f64..3.0, q.clone()).prop_map(|(a, q)| GateOp::Rz(a, q)),
        (q.clone(), q)
            .prop_filter("distinct qubits", |(c, t)| c != t)
            .prop_map(|(c, t)| GateOp::Cx(c, t)),
    ]
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (2_u32..=4, -1.0_f64..1.0).prop_flat_map(|(n, phase)| {
        prop::collection::vec(arb_gate(n), 0..12).prop_map(move |ops| {
            let mut circuit = Circuit::with_units(n, 0);
            for op in &ops {
                op.apply(&mut circuit);
            }
            circuit.add_phase(ParameterExpression::constant(phase));
            circuit
        })
    })
}

proptest! {
    #[test]
    fn prop_dagger_involution(circuit in arb_circuit()) {
        let twice = circuit.dagger().unwrap().dagger().unwrap();
        prop_assert_eq!(twice.units().collect::<Vec<_>>(), circuit.units().collect::<Vec<_>>());
        prop_assert_eq!(shape(&twice), shape(&circuit));
        let (p0, p1) = (circuit.phase().as_f64().unwrap(), twice.phase().as_f64().unwrap());
        prop_assert!((p0 - p1).abs() < 1e-12);
        twice.verify_integrity().unwrap();
    }

    #[test]
    fn prop_disjoint_append_counts(c1 in arb_circuit(), c2 in arb_circuit()) {
        let renamed: std::collections::BTreeMap<UnitId, UnitId> = c2
            .units()
            .map(|u| {
                let index = u.index[0] + 100;
                (u.clone(), UnitId::qubit(index))
            })
            .collect();
        let mut joined = c1.clone();
        joined.append_with_map(&c2, &renamed).unwrap();
        prop_assert_eq!(joined.n_units(), c1.n_units() + c2.n_units());
        prop_assert!(joined.commands().all(|c| !is_reset(c.op.as_ref())));
        prop_assert_eq!(joined.n_ops(), c1.n_ops() + c2.n_ops());
        joined.verify_integrity().unwrap();
    }

    #[test]
    fn prop_substitution_adds_phase(circuit in arb_circuit(), extra in -1.0_f64..1.0) {
        let mut host = circuit.clone();
        let target = host
            .add_op(StandardGate::H.into_op(), &[UnitId::qubit(0)], None)
            .unwrap();
        let before = host.phase().as_f64().unwrap();

        let mut replacement = Circuit::with_units(1, 0);
        replacement.s(0).unwrap().s(0).unwrap();
        replacement.add_phase(ParameterExpression::constant(extra));
        host.substitute_vertex(&replacement, target, VertexDeletion::Yes, OpGroupTransfer::Preserve)
            .unwrap();

        let after = host.phase().as_f64().unwrap();
        prop_assert!((after - (before + extra)).abs() < 1e-12);
        prop_assert_eq!(host.n_ops(), circuit.n_ops() + 2);
        host.verify_integrity().unwrap();
    }
}

//! The circuit: a graph plus its unit boundary and global phase.

use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::builtin::{Barrier, Measure, Reset};
use crate::error::{CircuitError, CircuitResult};
use crate::gate::StandardGate;
use crate::graph::{CircuitGraph, Edge, GraphRewiring, NodeKind, Vertex, VertexDeletion};
use crate::op::{OpRef, Signature, WireKind};
use crate::parameter::{ParameterExpression, SymbolMap, SymbolTable};
use crate::unit::{UnitId, UnitKind};

/// Boundary vertices of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryEntry {
    /// Input or Create vertex.
    pub input: Vertex,
    /// Output or Discard vertex.
    pub output: Vertex,
}

/// A quantum circuit.
///
/// Every unit has exactly one Input/Create and one Output/Discard vertex,
/// kept in canonical unit order.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    pub(crate) graph: CircuitGraph,
    pub(crate) boundary: BTreeMap<UnitId, BoundaryEntry>,
    pub(crate) phase: ParameterExpression,
    pub(crate) name: Option<String>,
    pub(crate) opgroups: BTreeMap<String, Signature>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a circuit with `num_qubits` default qubits and `num_bits`
    /// default bits.
    pub fn with_units(num_qubits: u32, num_bits: u32) -> Self {
        let mut circuit = Self::new();
        for unit in (0..num_qubits)
            .map(UnitId::qubit)
            .chain((0..num_bits).map(UnitId::bit))
        {
            circuit.insert_unit(unit);
        }
        circuit
    }

    /// Set the circuit name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name of the circuit, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set or clear the circuit name.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Read-only view of the underlying graph.
    pub fn graph(&self) -> &CircuitGraph {
        &self.graph
    }

    // =========================================================================
    // Units
    // =========================================================================

    fn insert_unit(&mut self, unit: UnitId) {
        let wire = unit.kind.wire_kind();
        let (input, output) =
            self.graph
                .add_wire(NodeKind::Input(wire), NodeKind::Output(wire), wire);
        self.boundary
            .insert(unit, BoundaryEntry { input, output });
    }

    pub(crate) fn check_register(&self, unit: &UnitId) -> CircuitResult<()> {
        if let Some(clash) = self.boundary.keys().find(|u| {
            u.register == unit.register
                && (u.kind != unit.kind || u.index.len() != unit.index.len())
        }) {
            return Err(CircuitError::invalid(format!(
                "Register {} is already used by {clash} with a different type",
                unit.register
            )));
        }
        Ok(())
    }

    /// Add a fresh wire for `unit`.
    pub fn add_unit(&mut self, unit: UnitId) -> CircuitResult<()> {
        if self.boundary.contains_key(&unit) {
            return Err(CircuitError::invalid(format!(
                "A unit with id {unit} already exists"
            )));
        }
        self.check_register(&unit)?;
        self.insert_unit(unit);
        Ok(())
    }

    /// Add a qubit wire.
    pub fn add_qubit(&mut self, unit: UnitId) -> CircuitResult<()> {
        if !unit.is_qubit() {
            return Err(CircuitError::UnitKindMismatch {
                unit,
                expected: UnitKind::Qubit,
            });
        }
        self.add_unit(unit)
    }

    /// Add a classical bit wire.
    pub fn add_bit(&mut self, unit: UnitId) -> CircuitResult<()> {
        if !unit.is_bit() {
            return Err(CircuitError::UnitKindMismatch {
                unit,
                expected: UnitKind::Bit,
            });
        }
        self.add_unit(unit)
    }

    /// All units in canonical order.
    pub fn units(&self) -> impl Iterator<Item = &UnitId> + '_ {
        self.boundary.keys()
    }

    /// Qubits in canonical order.
    pub fn qubits(&self) -> Vec<UnitId> {
        self.units().filter(|u| u.is_qubit()).cloned().collect()
    }

    /// Classical bits in canonical order.
    pub fn bits(&self) -> Vec<UnitId> {
        self.units().filter(|u| u.is_bit()).cloned().collect()
    }

    /// Whether `unit` is part of the boundary.
    #[inline]
    pub fn contains_unit(&self, unit: &UnitId) -> bool {
        self.boundary.contains_key(unit)
    }

    /// Number of units.
    #[inline]
    pub fn n_units(&self) -> usize {
        self.boundary.len()
    }

    /// Number of qubits.
    pub fn n_qubits(&self) -> usize {
        self.units().filter(|u| u.is_qubit()).count()
    }

    /// Number of classical bits.
    pub fn n_bits(&self) -> usize {
        self.units().filter(|u| u.is_bit()).count()
    }

    /// Number of operation vertices still wired into the circuit.
    ///
    /// Vertices left isolated by a removal with [`VertexDeletion::No`] are
    /// not counted.
    pub fn n_ops(&self) -> usize {
        self.graph
            .vertices()
            .filter(|&v| self.is_wired_op(v))
            .count()
    }

    fn is_wired_op(&self, v: Vertex) -> bool {
        let Ok(node) = self.graph.node(v) else {
            return false;
        };
        let Some(op) = node.kind.op() else {
            return false;
        };
        self.graph
            .in_edges(v)
            .is_ok_and(|ins| ins.len() == op.signature().len())
    }

    fn entry(&self, unit: &UnitId) -> CircuitResult<BoundaryEntry> {
        self.boundary
            .get(unit)
            .copied()
            .ok_or_else(|| CircuitError::UnitNotFound { unit: unit.clone() })
    }

    /// Input (or Create) vertex of a unit.
    pub fn input(&self, unit: &UnitId) -> CircuitResult<Vertex> {
        self.entry(unit).map(|e| e.input)
    }

    /// Output (or Discard) vertex of a unit.
    pub fn output(&self, unit: &UnitId) -> CircuitResult<Vertex> {
        self.entry(unit).map(|e| e.output)
    }

    pub(crate) fn unit_of_input(&self, v: Vertex) -> Option<&UnitId> {
        self.boundary
            .iter()
            .find(|(_, e)| e.input == v)
            .map(|(u, _)| u)
    }

    /// The unit a wire edge belongs to, found by tracing it back to its
    /// input.
    pub fn edge_unit(&self, e: Edge) -> CircuitResult<UnitId> {
        let mut info = self.graph.edge(e)?;
        while !self.graph.kind(info.source)?.is_input_boundary() {
            let prev = self.graph.in_edge(info.source, info.source_port)?;
            info = self.graph.edge(prev)?;
        }
        self.unit_of_input(info.source)
            .cloned()
            .ok_or_else(|| CircuitError::invalid("Input vertex is not registered in the boundary"))
    }

    /// Whether the qubit starts in a freshly created state.
    pub fn is_created(&self, unit: &UnitId) -> CircuitResult<bool> {
        Ok(matches!(
            self.graph.kind(self.input(unit)?)?,
            NodeKind::Create
        ))
    }

    /// Whether the qubit's final state is discarded.
    pub fn is_discarded(&self, unit: &UnitId) -> CircuitResult<bool> {
        Ok(matches!(
            self.graph.kind(self.output(unit)?)?,
            NodeKind::Discard
        ))
    }

    /// Mark a qubit as freshly created.
    pub fn qubit_create(&mut self, unit: &UnitId) -> CircuitResult<()> {
        if !unit.is_qubit() {
            return Err(CircuitError::UnitKindMismatch {
                unit: unit.clone(),
                expected: UnitKind::Qubit,
            });
        }
        let input = self.input(unit)?;
        self.graph.set_kind(input, NodeKind::Create)
    }

    /// Mark a qubit as discarded at the end.
    pub fn qubit_discard(&mut self, unit: &UnitId) -> CircuitResult<()> {
        if !unit.is_qubit() {
            return Err(CircuitError::UnitKindMismatch {
                unit: unit.clone(),
                expected: UnitKind::Qubit,
            });
        }
        let output = self.output(unit)?;
        self.graph.set_kind(output, NodeKind::Discard)
    }

    /// Whether every unit lives in its default one-dimensional register.
    pub fn is_simple(&self) -> bool {
        self.units().all(UnitId::in_default_register)
    }

    // =========================================================================
    // Phase and opgroups
    // =========================================================================

    /// Global phase in radians.
    pub fn phase(&self) -> &ParameterExpression {
        &self.phase
    }

    /// Add to the global phase.
    pub fn add_phase(&mut self, phase: ParameterExpression) {
        self.phase = std::mem::take(&mut self.phase) + phase;
    }

    /// Replace the global phase.
    pub fn set_phase(&mut self, phase: ParameterExpression) {
        self.phase = phase;
    }

    /// Registered opgroups and their signatures.
    pub fn opgroups(&self) -> &BTreeMap<String, Signature> {
        &self.opgroups
    }

    /// Operation vertices labeled with `opgroup`, in creation order.
    pub fn opgroup_vertices(&self, opgroup: &str) -> Vec<Vertex> {
        self.graph
            .vertices_by_sequence()
            .into_iter()
            .filter(|&v| self.graph.opgroup(v).ok().flatten() == Some(opgroup))
            .collect()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Append `op` on `args` at the output frontier.
    pub fn add_op(
        &mut self,
        op: OpRef,
        args: &[UnitId],
        opgroup: Option<&str>,
    ) -> CircuitResult<Vertex> {
        let sig = op.signature();
        if sig.len() != args.len() {
            return Err(CircuitError::ArgumentCountMismatch {
                op: op.name().to_string(),
                expected: sig.len(),
                got: args.len(),
            });
        }
        let mut linear = BTreeSet::new();
        let mut read = BTreeSet::new();
        for (unit, kind) in args.iter().zip(&sig) {
            if !self.boundary.contains_key(unit) {
                return Err(CircuitError::UnitNotFound { unit: unit.clone() });
            }
            if unit.kind != kind.unit_kind() {
                return Err(CircuitError::UnitKindMismatch {
                    unit: unit.clone(),
                    expected: kind.unit_kind(),
                });
            }
            if kind.is_linear() {
                if !linear.insert(unit) {
                    return Err(CircuitError::DuplicateUnit { unit: unit.clone() });
                }
            } else {
                read.insert(unit);
            }
        }
        if let Some(unit) = linear.intersection(&read).next() {
            return Err(CircuitError::DuplicateUnit {
                unit: (*unit).clone(),
            });
        }
        if let Some(name) = opgroup {
            match self.opgroups.get(name) {
                Some(existing) if *existing != sig => {
                    return Err(CircuitError::invalid(format!(
                        "Cannot add op {} to opgroup {name} with a different signature",
                        op.name()
                    )));
                }
                Some(_) => {}
                None => {
                    self.opgroups.insert(name.to_string(), sig.clone());
                }
            }
        }

        let v = self
            .graph
            .add_vertex(NodeKind::Op(op), opgroup.map(str::to_string));
        for (port, (unit, kind)) in args.iter().zip(sig).enumerate() {
            let out = self.entry(unit)?.output;
            let last = self.graph.in_edge(out, 0)?;
            let prev = self.graph.edge(last)?;
            if kind.is_linear() {
                self.graph.remove_edge(last)?;
                self.graph
                    .add_edge((prev.source, prev.source_port), (v, port), kind)?;
                self.graph.add_edge((v, port), (out, 0), kind)?;
            } else {
                self.graph.add_edge(
                    (prev.source, prev.source_port),
                    (v, port),
                    WireKind::Boolean,
                )?;
            }
        }
        Ok(v)
    }

    /// Append `op` on `args`, builder style.
    pub fn apply(&mut self, op: OpRef, args: &[UnitId]) -> CircuitResult<&mut Self> {
        self.add_op(op, args, None)?;
        Ok(self)
    }

    /// Operation held by an operation vertex.
    pub fn op_at(&self, v: Vertex) -> CircuitResult<OpRef> {
        self.graph
            .kind(v)?
            .op()
            .cloned()
            .ok_or_else(|| CircuitError::invalid("Vertex is not an operation"))
    }

    /// Remove an operation vertex, joining its wires back together.
    pub fn remove_op(&mut self, v: Vertex) -> CircuitResult<()> {
        if self.graph.kind(v)?.is_boundary() {
            return Err(CircuitError::invalid("Cannot remove a boundary vertex"));
        }
        self.graph
            .remove_vertex(v, GraphRewiring::Yes, VertexDeletion::Yes)
    }

    // =========================================================================
    // Gate shorthands on default registers
    // =========================================================================

    /// Apply Hadamard to `q[qubit]`.
    pub fn h(&mut self, qubit: u32) -> CircuitResult<&mut Self> {
        self.apply(StandardGate::H.into_op(), &[UnitId::qubit(qubit)])
    }

    /// Apply Pauli-X to `q[qubit]`.
    pub fn x(&mut self, qubit: u32) -> CircuitResult<&mut Self> {
        self.apply(StandardGate::X.into_op(), &[UnitId::qubit(qubit)])
    }

    /// Apply Pauli-Z to `q[qubit]`.
    pub fn z(&mut self, qubit: u32) -> CircuitResult<&mut Self> {
        self.apply(StandardGate::Z.into_op(), &[UnitId::qubit(qubit)])
    }

    /// Apply S to `q[qubit]`.
    pub fn s(&mut self, qubit: u32) -> CircuitResult<&mut Self> {
        self.apply(StandardGate::S.into_op(), &[UnitId::qubit(qubit)])
    }

    /// Apply T to `q[qubit]`.
    pub fn t(&mut self, qubit: u32) -> CircuitResult<&mut Self> {
        self.apply(StandardGate::T.into_op(), &[UnitId::qubit(qubit)])
    }

    /// Apply Rz to `q[qubit]`.
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: u32,
    ) -> CircuitResult<&mut Self> {
        self.apply(
            StandardGate::Rz(theta.into()).into_op(),
            &[UnitId::qubit(qubit)],
        )
    }

    /// Apply CNOT with control `q[control]` and target `q[target]`.
    pub fn cx(&mut self, control: u32, target: u32) -> CircuitResult<&mut Self> {
        self.apply(
            StandardGate::CX.into_op(),
            &[UnitId::qubit(control), UnitId::qubit(target)],
        )
    }

    /// Measure `q[qubit]` into `c[bit]`.
    pub fn measure(&mut self, qubit: u32, bit: u32) -> CircuitResult<&mut Self> {
        self.apply(Arc::new(Measure), &[UnitId::qubit(qubit), UnitId::bit(bit)])
    }

    /// Reset `q[qubit]`.
    pub fn reset(&mut self, qubit: u32) -> CircuitResult<&mut Self> {
        self.apply(Arc::new(Reset), &[UnitId::qubit(qubit)])
    }

    /// Barrier across the given default qubits.
    pub fn barrier(&mut self, qubits: &[u32]) -> CircuitResult<&mut Self> {
        let args: Vec<UnitId> = qubits.iter().copied().map(UnitId::qubit).collect();
        self.apply(Arc::new(Barrier::qubits(args.len())), &args)
    }

    // =========================================================================
    // Whole-circuit queries
    // =========================================================================

    /// Free symbols of every operation and the global phase.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut symbols = self.phase.free_symbols();
        for cmd in self.commands() {
            symbols.extend(cmd.op.free_symbols());
        }
        symbols
    }

    /// Whether any symbol is left unbound.
    pub fn is_symbolic(&self) -> bool {
        !self.free_symbols().is_empty()
    }

    /// Substitute symbols in every operation and the global phase.
    ///
    /// Symbols introduced by the replacement expressions are recorded in
    /// `table`.
    pub fn symbol_substitution(
        &mut self,
        map: &SymbolMap,
        table: &mut SymbolTable,
    ) -> CircuitResult<()> {
        for expr in map.values() {
            table.register_all(expr);
        }
        let vertices: Vec<Vertex> = self.graph.vertices().collect();
        for v in vertices {
            let replacement = self.graph.kind(v)?.op().and_then(|op| op.substitute(map));
            if let Some(op) = replacement {
                self.graph.set_kind(v, NodeKind::Op(op))?;
            }
        }
        self.phase = self.phase.substitute(map).simplify();
        Ok(())
    }

    /// Longest chain of operations along any unit.
    pub fn depth(&self) -> usize {
        let mut depths: FxHashMap<UnitId, usize> = FxHashMap::default();
        let mut max_depth = 0;
        for cmd in self.commands() {
            let d = cmd
                .args
                .iter()
                .map(|u| depths.get(u).copied().unwrap_or(0))
                .max()
                .unwrap_or(0)
                + 1;
            for unit in cmd.args {
                depths.insert(unit, d);
            }
            max_depth = max_depth.max(d);
        }
        max_depth
    }

    // =========================================================================
    // Unit maintenance
    // =========================================================================

    /// Rename units simultaneously. Units missing from the circuit are
    /// ignored.
    ///
    /// Returns whether any unit changed. Fails if a rename changes a unit's
    /// kind or makes two units collide.
    pub fn rename_units(&mut self, map: &BTreeMap<UnitId, UnitId>) -> CircuitResult<bool> {
        for (old, new) in map {
            if old.kind != new.kind {
                return Err(CircuitError::invalid(format!(
                    "Cannot rename {old} to {new}: unit kinds differ"
                )));
            }
        }
        let mut renamed = BTreeMap::new();
        let mut changed = false;
        for (unit, entry) in &self.boundary {
            let target = map.get(unit).unwrap_or(unit);
            changed |= target != unit;
            if renamed.insert(target.clone(), *entry).is_some() {
                return Err(CircuitError::invalid(format!(
                    "Cannot rename units: {target} would appear twice"
                )));
            }
        }
        self.boundary = renamed;
        Ok(changed)
    }

    /// Move every unit into its kind's default register, indexed in
    /// canonical order. Returns the applied renaming.
    pub fn flatten_registers(&mut self) -> CircuitResult<BTreeMap<UnitId, UnitId>> {
        let mut counters: BTreeMap<UnitKind, u32> = BTreeMap::new();
        let mut map = BTreeMap::new();
        for unit in self.boundary.keys() {
            let next = counters.entry(unit.kind).or_default();
            map.insert(
                unit.clone(),
                UnitId::new(unit.kind, unit.kind.default_register(), [*next]),
            );
            *next += 1;
        }
        self.rename_units(&map)?;
        Ok(map)
    }

    /// Remove units whose input feeds their output directly and is never
    /// read. Returns the removed units.
    pub fn remove_blank_wires(&mut self) -> CircuitResult<Vec<UnitId>> {
        let mut blank = Vec::new();
        for (unit, entry) in &self.boundary {
            let out = self.graph.out_edges(entry.input)?;
            if out.len() == 1 && self.graph.edge(out[0])?.target == entry.output {
                blank.push(unit.clone());
            }
        }
        for unit in &blank {
            if let Some(entry) = self.boundary.remove(unit) {
                self.graph
                    .remove_vertex(entry.input, GraphRewiring::No, VertexDeletion::Yes)?;
                self.graph
                    .remove_vertex(entry.output, GraphRewiring::No, VertexDeletion::Yes)?;
            }
        }
        if !blank.is_empty() {
            debug!(removed = blank.len(), "removed blank wires");
        }
        Ok(blank)
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Verify the structural invariants of the circuit.
    ///
    /// Checks that:
    /// - The graph is acyclic
    /// - Every unit has boundary vertices of the right kind
    /// - No boundary vertex exists outside the boundary map
    /// - Every operation's edges agree with its signature, port by port
    pub fn verify_integrity(&self) -> CircuitResult<()> {
        if !self.graph.is_acyclic() {
            return Err(CircuitError::invalid("Graph contains a cycle"));
        }

        for (unit, entry) in &self.boundary {
            let wire = unit.kind.wire_kind();
            let input_ok = match self.graph.kind(entry.input)? {
                NodeKind::Input(k) => *k == wire,
                NodeKind::Create => unit.is_qubit(),
                _ => false,
            };
            let output_ok = match self.graph.kind(entry.output)? {
                NodeKind::Output(k) => *k == wire,
                NodeKind::Discard => unit.is_qubit(),
                _ => false,
            };
            if !input_ok || !output_ok {
                return Err(CircuitError::invalid(format!(
                    "Unit {unit} has malformed boundary vertices"
                )));
            }
            if !self.graph.in_edges(entry.input)?.is_empty()
                || self.graph.out_edge(entry.input, 0).is_err()
            {
                return Err(CircuitError::invalid(format!(
                    "Input of {unit} is not the start of a wire"
                )));
            }
            if self.graph.in_edges(entry.output)?.len() != 1
                || !self.graph.out_edges(entry.output)?.is_empty()
            {
                return Err(CircuitError::invalid(format!(
                    "Output of {unit} is not the end of a wire"
                )));
            }
        }

        let mut boundary_vertices = 0;
        for v in self.graph.vertices() {
            let kind = self.graph.kind(v)?;
            if kind.is_boundary() {
                boundary_vertices += 1;
                continue;
            }
            let sig = kind.signature();
            let ins = self.graph.in_edges(v)?;
            if ins.len() != sig.len() {
                return Err(CircuitError::invalid(format!(
                    "Operation {} has {} in-edges for {} ports",
                    kind.label(),
                    ins.len(),
                    sig.len()
                )));
            }
            for (port, expected) in sig.iter().enumerate() {
                let incoming = self.graph.edge(self.graph.in_edge(v, port)?)?;
                if incoming.kind != *expected {
                    return Err(CircuitError::invalid(format!(
                        "Operation {} expects {expected} on port {port}, found {}",
                        kind.label(),
                        incoming.kind
                    )));
                }
                if expected.is_linear() {
                    let outgoing = self.graph.edge(self.graph.out_edge(v, port)?)?;
                    if outgoing.kind != *expected {
                        return Err(CircuitError::invalid(format!(
                            "Operation {} emits {} on port {port}",
                            kind.label(),
                            outgoing.kind
                        )));
                    }
                }
            }
        }
        if boundary_vertices != 2 * self.boundary.len() {
            return Err(CircuitError::invalid(
                "Boundary vertices do not match the unit boundary",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cmd in self.commands() {
            writeln!(f, "{cmd}")?;
        }
        write!(f, "global phase: {}", self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_units() {
        let circuit = Circuit::with_units(3, 2);
        assert_eq!(circuit.n_qubits(), 3);
        assert_eq!(circuit.n_bits(), 2);
        assert_eq!(circuit.n_ops(), 0);
        assert!(circuit.is_simple());
        circuit.verify_integrity().unwrap();
    }

    #[test]
    fn test_duplicate_unit() {
        let mut circuit = Circuit::with_units(1, 0);
        assert!(matches!(
            circuit.add_qubit(UnitId::qubit(0)),
            Err(CircuitError::CircuitInvalidity(_))
        ));
        assert!(circuit.add_bit(UnitId::qubit(1)).is_err());
        assert!(circuit.add_unit(UnitId::new(UnitKind::Bit, "q", [4])).is_err());
    }

    #[test]
    fn test_add_op_validation() {
        let mut circuit = Circuit::with_units(2, 1);
        let err = circuit
            .add_op(StandardGate::CX.into_op(), &[UnitId::qubit(0)], None)
            .unwrap_err();
        assert!(matches!(err, CircuitError::ArgumentCountMismatch { .. }));
        let err = circuit
            .add_op(
                StandardGate::CX.into_op(),
                &[UnitId::qubit(0), UnitId::qubit(0)],
                None,
            )
            .unwrap_err();
        assert!(matches!(err, CircuitError::DuplicateUnit { .. }));
        let err = circuit
            .add_op(StandardGate::H.into_op(), &[UnitId::bit(0)], None)
            .unwrap_err();
        assert!(matches!(err, CircuitError::UnitKindMismatch { .. }));
        let err = circuit
            .add_op(StandardGate::H.into_op(), &[UnitId::qubit(7)], None)
            .unwrap_err();
        assert!(matches!(err, CircuitError::UnitNotFound { .. }));
    }

    #[test]
    fn test_opgroup_signature() {
        let mut circuit = Circuit::with_units(2, 0);
        circuit
            .add_op(StandardGate::H.into_op(), &[UnitId::qubit(0)], Some("g"))
            .unwrap();
        circuit
            .add_op(StandardGate::X.into_op(), &[UnitId::qubit(1)], Some("g"))
            .unwrap();
        assert!(
            circuit
                .add_op(
                    StandardGate::CX.into_op(),
                    &[UnitId::qubit(0), UnitId::qubit(1)],
                    Some("g")
                )
                .is_err()
        );
        assert_eq!(circuit.opgroup_vertices("g").len(), 2);
    }

    #[test]
    fn test_bell_depth() {
        let mut circuit = Circuit::with_units(2, 2);
        circuit.h(0).unwrap().cx(0, 1).unwrap();
        circuit.measure(0, 0).unwrap().measure(1, 1).unwrap();
        assert_eq!(circuit.n_ops(), 4);
        assert_eq!(circuit.depth(), 3);
        circuit.verify_integrity().unwrap();
    }

    #[test]
    fn test_edge_unit() {
        let mut circuit = Circuit::with_units(2, 0);
        circuit.h(1).unwrap();
        let out = circuit.output(&UnitId::qubit(1)).unwrap();
        let last = circuit.graph().in_edge(out, 0).unwrap();
        assert_eq!(circuit.edge_unit(last).unwrap(), UnitId::qubit(1));
    }

    #[test]
    fn test_rename_and_flatten() {
        let mut circuit = Circuit::new();
        circuit.add_qubit(UnitId::new(UnitKind::Qubit, "a", [5])).unwrap();
        circuit.add_qubit(UnitId::qubit(0)).unwrap();
        circuit.add_bit(UnitId::new(UnitKind::Bit, "m", [0, 1])).unwrap();
        assert!(!circuit.is_simple());
        let map = circuit.flatten_registers().unwrap();
        assert_eq!(map[&UnitId::new(UnitKind::Qubit, "a", [5])], UnitId::qubit(0));
        assert_eq!(map[&UnitId::qubit(0)], UnitId::qubit(1));
        assert!(circuit.is_simple());

        let mut bad = BTreeMap::new();
        bad.insert(UnitId::qubit(0), UnitId::bit(0));
        assert!(circuit.rename_units(&bad).is_err());
        let mut collide = BTreeMap::new();
        collide.insert(UnitId::qubit(0), UnitId::qubit(1));
        assert!(circuit.rename_units(&collide).is_err());
    }

    #[test]
    fn test_remove_blank_wires() {
        let mut circuit = Circuit::with_units(3, 1);
        circuit.h(1).unwrap();
        let removed = circuit.remove_blank_wires().unwrap();
        assert_eq!(removed, vec![UnitId::qubit(0), UnitId::qubit(2), UnitId::bit(0)]);
        assert_eq!(circuit.n_units(), 1);
        circuit.verify_integrity().unwrap();
    }

    #[test]
    fn test_create_discard_flags() {
        let mut circuit = Circuit::with_units(1, 1);
        circuit.qubit_create(&UnitId::qubit(0)).unwrap();
        circuit.qubit_discard(&UnitId::qubit(0)).unwrap();
        assert!(circuit.is_created(&UnitId::qubit(0)).unwrap());
        assert!(circuit.is_discarded(&UnitId::qubit(0)).unwrap());
        assert!(circuit.qubit_create(&UnitId::bit(0)).is_err());
        circuit.verify_integrity().unwrap();
    }

    #[test]
    fn test_symbol_substitution() {
        let mut circuit = Circuit::with_units(1, 0);
        circuit.rz(ParameterExpression::symbol("a"), 0).unwrap();
        circuit.add_phase(ParameterExpression::symbol("b"));
        assert_eq!(circuit.free_symbols().len(), 2);

        let mut map = SymbolMap::default();
        map.insert("a".into(), ParameterExpression::constant(0.5));
        map.insert("b".into(), ParameterExpression::symbol("c"));
        let mut table = SymbolTable::new();
        circuit.symbol_substitution(&map, &mut table).unwrap();
        assert_eq!(
            circuit.free_symbols().into_iter().collect::<Vec<_>>(),
            vec!["c".to_string()]
        );
        assert!(table.contains("c"));
    }

    #[test]
    fn test_remove_op_rewires() {
        let mut circuit = Circuit::with_units(1, 0);
        let v = circuit
            .add_op(StandardGate::H.into_op(), &[UnitId::qubit(0)], None)
            .unwrap();
        circuit.remove_op(v).unwrap();
        assert_eq!(circuit.n_ops(), 0);
        let input = circuit.input(&UnitId::qubit(0)).unwrap();
        assert!(circuit.remove_op(input).is_err());
        circuit.verify_integrity().unwrap();
    }

    #[test]
    fn test_isolated_vertex_not_counted() {
        let mut circuit = Circuit::with_units(1, 0);
        circuit.h(0).unwrap().x(0).unwrap();
        let v = circuit.get_commands()[0].vertex;
        circuit
            .graph
            .remove_vertex(v, GraphRewiring::Yes, VertexDeletion::No)
            .unwrap();
        assert!(circuit.graph().contains_vertex(v));
        assert_eq!(circuit.n_ops(), 1);
        assert_eq!(circuit.n_ops(), circuit.commands().count());
    }

    #[test]
    fn test_display() {
        let mut circuit = Circuit::with_units(2, 0);
        circuit.h(0).unwrap().cx(0, 1).unwrap();
        assert_eq!(circuit.to_string(), "h q[0];\ncx q[0], q[1];\nglobal phase: 0");
    }
}

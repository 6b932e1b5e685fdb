//! Graph copying and hole substitution.

use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::builtin::{Conditional, Phase, Reset, as_conditional};
use crate::circuit::{BoundaryEntry, Circuit};
use crate::error::{CircuitError, CircuitResult};
use crate::graph::{Edge, GraphRewiring, NodeKind, Vertex, VertexDeletion};
use crate::op::{OpRef, Operation, WireKind};
use crate::subcircuit::Subcircuit;
use crate::unit::UnitId;

/// Map from a source vertex to its copy.
pub type VertexMap = FxHashMap<Vertex, Vertex>;

/// How opgroup names of an inserted circuit are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpGroupTransfer {
    /// Keep names; fail on any collision with the host.
    #[default]
    Preserve,
    /// Fail if the inserted circuit has any names.
    Disallow,
    /// Keep names; colliding names must have the same signature.
    Merge,
    /// Drop names.
    Remove,
}

/// Whether copied boundary vertices join the host boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMerge {
    /// Register the source's units in the host.
    Yes,
    /// Leave the copied boundary vertices unregistered.
    No,
}

fn mapped(map: &VertexMap, v: Vertex) -> CircuitResult<Vertex> {
    map.get(&v).copied().ok_or(CircuitError::MissingVertex)
}

fn boundary_mismatch() -> CircuitError {
    CircuitError::invalid("Subcircuit boundary mismatch to hole")
}

impl Circuit {
    /// Copy every vertex and edge of `src` into this circuit.
    ///
    /// Vertices are copied in creation order, so the copy's commands keep
    /// their relative order. Returns the vertex isomorphism.
    pub fn copy_graph(
        &mut self,
        src: &Circuit,
        boundary: BoundaryMerge,
        opgroups: OpGroupTransfer,
    ) -> CircuitResult<VertexMap> {
        match opgroups {
            OpGroupTransfer::Preserve => {
                if src.opgroups.keys().any(|n| self.opgroups.contains_key(n)) {
                    return Err(CircuitError::invalid("Name collision in inserted circuit"));
                }
            }
            OpGroupTransfer::Disallow => {
                if !src.opgroups.is_empty() {
                    return Err(CircuitError::invalid(
                        "Inserted circuit contains opgroup names",
                    ));
                }
            }
            OpGroupTransfer::Merge => {
                for (name, sig) in &src.opgroups {
                    if self.opgroups.get(name).is_some_and(|s| s != sig) {
                        return Err(CircuitError::invalid(format!(
                            "Opgroup {name} has different signatures in the two circuits"
                        )));
                    }
                }
            }
            OpGroupTransfer::Remove => {}
        }
        if boundary == BoundaryMerge::Yes {
            for unit in src.boundary.keys() {
                if self.boundary.contains_key(unit) {
                    return Err(CircuitError::unsupported(format!(
                        "Cannot merge circuits with a shared unit {unit}"
                    )));
                }
                if self
                    .boundary
                    .keys()
                    .any(|u| u.register == unit.register && u.kind != unit.kind)
                {
                    return Err(CircuitError::unsupported(format!(
                        "Cannot merge circuits: register {} has different kinds",
                        unit.register
                    )));
                }
            }
        }

        let keep_names = matches!(opgroups, OpGroupTransfer::Preserve | OpGroupTransfer::Merge);
        let mut isomap = VertexMap::default();
        for v in src.graph.vertices_by_sequence() {
            let node = src.graph.node(v)?;
            let opgroup = if keep_names { node.opgroup.clone() } else { None };
            isomap.insert(v, self.graph.add_vertex(node.kind.clone(), opgroup));
        }
        for e in src.graph.edges() {
            let info = src.graph.edge(e)?;
            self.graph.add_edge(
                (mapped(&isomap, info.source)?, info.source_port),
                (mapped(&isomap, info.target)?, info.target_port),
                info.kind,
            )?;
        }
        if keep_names {
            for (name, sig) in &src.opgroups {
                self.opgroups
                    .entry(name.clone())
                    .or_insert_with(|| sig.clone());
            }
        }
        if boundary == BoundaryMerge::Yes {
            for (unit, entry) in &src.boundary {
                self.boundary.insert(
                    unit.clone(),
                    BoundaryEntry {
                        input: mapped(&isomap, entry.input)?,
                        output: mapped(&isomap, entry.output)?,
                    },
                );
            }
        }
        debug!(vertices = isomap.len(), "copied circuit graph");
        Ok(isomap)
    }

    /// Replace the region described by `hole` with `to_insert`.
    ///
    /// Unit `i` of `to_insert`, in canonical order, fills slot `i`. The
    /// replacement must be simple. Region vertices are removed according to
    /// `deletion`, and the replacement's global phase is added.
    #[instrument(skip_all, fields(slots = hole.n_slots()))]
    pub fn substitute(
        &mut self,
        to_insert: &Circuit,
        hole: &Subcircuit,
        deletion: VertexDeletion,
        opgroups: OpGroupTransfer,
    ) -> CircuitResult<()> {
        if !to_insert.is_simple() {
            return Err(CircuitError::SimpleOnly);
        }
        if hole.in_hole.len() != hole.out_hole.len() || to_insert.n_units() != hole.n_slots() {
            return Err(boundary_mismatch());
        }
        if !self.is_convex(&hole.verts)? {
            return Err(CircuitError::invalid(
                "Subcircuit is not convex: a path leaves it and re-enters",
            ));
        }
        let units: Vec<(&UnitId, BoundaryEntry)> =
            to_insert.boundary.iter().map(|(u, e)| (u, *e)).collect();
        for (i, (unit, entry)) in units.iter().enumerate() {
            let kind = self.graph.edge(hole.in_hole[i])?.kind;
            if kind.unit_kind() != unit.kind || kind.is_linear() != hole.out_hole[i].is_some() {
                return Err(boundary_mismatch());
            }
            if kind == WireKind::Boolean {
                let through = to_insert.graph.edge(to_insert.graph.out_edge(entry.input, 0)?)?;
                if through.target != entry.output {
                    return Err(CircuitError::invalid(format!(
                        "Cannot substitute a circuit writing to {unit}, which the hole only reads"
                    )));
                }
            }
        }

        let isomap = self.copy_graph(to_insert, BoundaryMerge::No, opgroups)?;
        let mut rewire_bin: Vec<Vertex> = Vec::new();
        let mut drop_bin: Vec<Vertex> = Vec::new();
        let mut edge_bin: BTreeSet<Edge> = BTreeSet::new();
        let mut writers: FxHashMap<Edge, Vertex> = FxHashMap::default();

        for (i, (_, entry)) in units.iter().enumerate() {
            let inp = mapped(&isomap, entry.input)?;
            let outp = mapped(&isomap, entry.output)?;
            let pred = self.graph.edge(hole.in_hole[i])?;
            let Some(exit) = hole.out_hole[i] else {
                for b in self.graph.boolean_out_edges(inp, 0)? {
                    let read = self.graph.edge(b)?;
                    self.graph.add_edge(
                        (pred.source, pred.source_port),
                        (read.target, read.target_port),
                        WireKind::Boolean,
                    )?;
                }
                drop_bin.extend([inp, outp]);
                continue;
            };
            let succ = self.graph.edge(exit)?;
            self.graph
                .add_edge((pred.source, pred.source_port), (inp, 0), pred.kind)?;
            self.graph
                .add_edge((outp, 0), (succ.target, succ.target_port), pred.kind)?;
            edge_bin.insert(hole.in_hole[i]);
            edge_bin.insert(exit);

            let fresh_input = matches!(self.graph.kind(inp)?, NodeKind::Create);
            let fresh_pred = matches!(self.graph.kind(pred.source)?, NodeKind::Create);
            if fresh_input && !fresh_pred {
                self.graph.set_kind(inp, NodeKind::Op(Arc::new(Reset)))?;
            } else {
                rewire_bin.push(inp);
            }
            if matches!(self.graph.kind(outp)?, NodeKind::Discard)
                && matches!(self.graph.kind(succ.target)?, NodeKind::Output(_))
            {
                self.graph.set_kind(succ.target, NodeKind::Discard)?;
            }
            rewire_bin.push(outp);
            writers.insert(exit, outp);
        }

        for &b in &hole.b_future {
            let read = self.graph.edge(b)?;
            let mut writer = None;
            for (exit, outp) in &writers {
                let out = self.graph.edge(*exit)?;
                if (out.source, out.source_port) == (read.source, read.source_port) {
                    writer = Some(*outp);
                    break;
                }
            }
            let Some(outp) = writer else {
                return Err(CircuitError::invalid(
                    "Boolean read leaving the hole has no matching classical out-hole",
                ));
            };
            self.graph
                .add_edge((outp, 0), (read.target, read.target_port), WireKind::Boolean)?;
            edge_bin.insert(b);
        }

        for e in edge_bin {
            if self.graph.contains_edge(e) {
                self.graph.remove_edge(e)?;
            }
        }
        for v in rewire_bin {
            self.graph
                .remove_vertex(v, GraphRewiring::Yes, VertexDeletion::Yes)?;
        }
        for v in drop_bin {
            self.graph
                .remove_vertex(v, GraphRewiring::No, VertexDeletion::Yes)?;
        }
        for &v in &hole.verts {
            self.graph.remove_vertex(v, GraphRewiring::No, deletion)?;
        }
        self.add_phase(to_insert.phase.clone());
        debug!(removed = hole.verts.len(), inserted = to_insert.n_ops(), "substituted hole");
        Ok(())
    }

    /// Replace one operation vertex with `to_insert`.
    pub fn substitute_vertex(
        &mut self,
        to_insert: &Circuit,
        v: Vertex,
        deletion: VertexDeletion,
        opgroups: OpGroupTransfer,
    ) -> CircuitResult<()> {
        let hole = self.singleton_subcircuit(v)?;
        self.substitute(to_insert, &hole, deletion, opgroups)
    }

    /// Replace the operation at `v` in place.
    pub fn substitute_op(&mut self, op: OpRef, v: Vertex) -> CircuitResult<()> {
        let current = self.op_at(v)?;
        if current.signature() != op.signature() {
            return Err(CircuitError::invalid(format!(
                "Cannot replace {} with {}: signatures differ",
                current.name(),
                op.name()
            )));
        }
        self.graph.set_kind(v, NodeKind::Op(op))
    }

    /// Replace every operation equal to `op` with `to_insert`.
    ///
    /// Returns whether anything was replaced.
    pub fn substitute_all(
        &mut self,
        to_insert: &Circuit,
        op: &dyn Operation,
    ) -> CircuitResult<bool> {
        let targets: Vec<Vertex> = self
            .graph
            .vertices_by_sequence()
            .into_iter()
            .filter(|&v| {
                self.graph
                    .kind(v)
                    .ok()
                    .and_then(NodeKind::op)
                    .is_some_and(|o| o.is_equal(op))
            })
            .collect();
        for &v in &targets {
            self.substitute_vertex(to_insert, v, VertexDeletion::Yes, OpGroupTransfer::Merge)?;
        }
        Ok(!targets.is_empty())
    }

    /// Replace every vertex of `opgroup` with `to_insert`, then forget the
    /// group.
    ///
    /// Returns whether anything was replaced.
    pub fn substitute_named(&mut self, to_insert: &Circuit, opgroup: &str) -> CircuitResult<bool> {
        if !to_insert.is_simple() {
            return Err(CircuitError::SimpleOnly);
        }
        if to_insert.opgroups.keys().any(|n| self.opgroups.contains_key(n)) {
            return Err(CircuitError::invalid("Name collision in replacement circuit"));
        }
        let Some(sig) = self.opgroups.get(opgroup) else {
            return Ok(false);
        };
        let mut expected: Vec<_> = sig.iter().map(|k| k.unit_kind()).collect();
        expected.sort_unstable();
        let provided: Vec<_> = to_insert.units().map(|u| u.kind).collect();
        if expected != provided {
            return Err(CircuitError::invalid(format!(
                "Replacement circuit does not match the signature of opgroup {opgroup}"
            )));
        }
        let targets = self.opgroup_vertices(opgroup);
        for &v in &targets {
            self.substitute_vertex(to_insert, v, VertexDeletion::Yes, OpGroupTransfer::Merge)?;
        }
        self.opgroups.remove(opgroup);
        Ok(!targets.is_empty())
    }

    /// Replace the operation of every vertex in `opgroup` with `op`.
    ///
    /// Returns whether anything was replaced.
    pub fn substitute_named_op(&mut self, op: OpRef, opgroup: &str) -> CircuitResult<bool> {
        let Some(sig) = self.opgroups.get(opgroup) else {
            return Ok(false);
        };
        if *sig != op.signature() {
            return Err(CircuitError::invalid(format!(
                "Operation {} does not match the signature of opgroup {opgroup}",
                op.name()
            )));
        }
        let targets = self.opgroup_vertices(opgroup);
        for &v in &targets {
            self.graph.set_kind(v, NodeKind::Op(op.clone()))?;
        }
        Ok(!targets.is_empty())
    }

    /// Replace a conditional operation with `to_insert`, conditioned the
    /// same way.
    ///
    /// `to_insert` replaces the innermost unconditional operation; its bits
    /// are shifted past the condition bits.
    pub fn substitute_conditional(
        &mut self,
        to_insert: &Circuit,
        v: Vertex,
        deletion: VertexDeletion,
        opgroups: OpGroupTransfer,
    ) -> CircuitResult<()> {
        if !to_insert.is_simple() {
            return Err(CircuitError::SimpleOnly);
        }
        let op = self.op_at(v)?;
        let Some(cond) = as_conditional(op.as_ref()) else {
            return Err(CircuitError::invalid(
                "substitute_conditional called with an unconditional operation",
            ));
        };
        let (layers, _) = cond.unwind();
        let total: usize = layers.iter().map(|(width, _)| width).sum();
        let shift = u32::try_from(total)
            .map_err(|_| CircuitError::invalid("Condition is too wide"))?;

        let mut wrapped = to_insert.clone();
        let shifted: BTreeMap<UnitId, UnitId> = to_insert
            .bits()
            .into_iter()
            .map(|b| {
                let index = b.index[0] + shift;
                (b, UnitId::bit(index))
            })
            .collect();
        wrapped.rename_units(&shifted)?;

        let mut offset = total;
        for &(width, value) in layers.iter().rev() {
            offset -= width;
            let bits: Vec<UnitId> = (offset..offset + width)
                .map(|i| UnitId::bit(i as u32))
                .collect();
            wrapped = wrapped.conditional_circuit(&bits, value)?;
        }
        let hole = self.singleton_subcircuit(v)?;
        self.substitute(&wrapped, &hole, deletion, opgroups)
    }

    /// Insert `to_insert` across a set of wire edges.
    ///
    /// Edge `i` of `cut` is split around unit `i` of `to_insert`.
    pub fn cut_insert(
        &mut self,
        to_insert: &Circuit,
        cut: &[Edge],
        b_future: Vec<Edge>,
    ) -> CircuitResult<()> {
        let hole = Subcircuit {
            in_hole: cut.to_vec(),
            out_hole: cut.iter().copied().map(Some).collect(),
            b_future,
            verts: BTreeSet::new(),
        };
        self.substitute(to_insert, &hole, VertexDeletion::Yes, OpGroupTransfer::Preserve)
    }

    /// A copy of this circuit whose every operation only fires when `bits`
    /// read `value`.
    ///
    /// Missing condition bits are added. A non-zero global phase becomes a
    /// conditional phase operation.
    pub fn conditional_circuit(&self, bits: &[UnitId], value: u64) -> CircuitResult<Circuit> {
        let width = bits.len();
        let mut cond = Circuit::new();
        cond.name = self.name.clone();
        for unit in self.units() {
            cond.add_unit(unit.clone())?;
            if self.is_created(unit)? {
                cond.qubit_create(unit)?;
            }
            if self.is_discarded(unit)? {
                cond.qubit_discard(unit)?;
            }
        }
        for bit in bits {
            if !bit.is_bit() {
                return Err(CircuitError::UnitKindMismatch {
                    unit: bit.clone(),
                    expected: crate::unit::UnitKind::Bit,
                });
            }
            if !cond.contains_unit(bit) {
                cond.add_unit(bit.clone())?;
            }
        }
        for cmd in self.commands() {
            let sig = cmd.op.signature();
            let writes_condition = cmd
                .args
                .iter()
                .zip(&sig)
                .any(|(u, k)| *k == WireKind::Classical && bits.contains(u));
            if writes_condition {
                return Err(CircuitError::invalid(
                    "Cannot add a condition to a circuit that writes a condition bit",
                ));
            }
            let op: OpRef = Arc::new(Conditional::new(cmd.op, width, value)?);
            let args: Vec<UnitId> = bits.iter().cloned().chain(cmd.args).collect();
            cond.add_op(op, &args, cmd.opgroup.as_deref())?;
        }
        if !self.phase.is_zero() {
            let phase: OpRef = Arc::new(Phase(self.phase.clone()));
            cond.add_op(Arc::new(Conditional::new(phase, width, value)?), bits, None)?;
        }
        Ok(cond)
    }
}

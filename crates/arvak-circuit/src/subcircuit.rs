//! Hole selection for substitution.

use std::collections::{BTreeMap, BTreeSet};

use crate::circuit::Circuit;
use crate::error::{CircuitError, CircuitResult};
use crate::graph::{Edge, Port, Vertex};
use crate::op::WireKind;
use crate::unit::UnitId;

/// A region of a circuit, described by the edges crossing its boundary.
///
/// Slot `i` is `in_hole[i]` paired with `out_hole[i]`. Linear slots carry
/// both edges; Boolean read slots have no out-hole. `b_future` holds
/// Boolean reads leaving the region, which fan out and so are not slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subcircuit {
    /// Edges entering the region, one per slot.
    pub in_hole: Vec<Edge>,
    /// Edges leaving the region, `None` for Boolean slots.
    pub out_hole: Vec<Option<Edge>>,
    /// Boolean reads from region vertices by vertices outside it.
    pub b_future: Vec<Edge>,
    /// Interior vertices.
    pub verts: BTreeSet<Vertex>,
}

impl Subcircuit {
    /// Number of slots.
    #[inline]
    pub fn n_slots(&self) -> usize {
        self.in_hole.len()
    }
}

#[derive(Default)]
struct UnitCrossing {
    linear: Option<(Edge, Edge)>,
    reads: Vec<Edge>,
}

fn slot_rank(kind: WireKind) -> u8 {
    match kind {
        WireKind::Quantum => 0,
        WireKind::Classical | WireKind::Boolean => 1,
        WireKind::Wasm => 2,
        WireKind::Rng => 3,
    }
}

impl Circuit {
    /// Whether no path leaves `verts` and re-enters it.
    ///
    /// Every vertex in both the past and the future of the region must lie
    /// inside it. The walk starts at the region's outside successors.
    pub fn is_convex(&self, verts: &BTreeSet<Vertex>) -> CircuitResult<bool> {
        let mut stack = Vec::new();
        for &v in verts {
            for e in self.graph.out_edges(v)? {
                let target = self.graph.edge(e)?.target;
                if !verts.contains(&target) {
                    stack.push(target);
                }
            }
        }
        let mut seen: BTreeSet<Vertex> = stack.iter().copied().collect();
        while let Some(v) = stack.pop() {
            for e in self.graph.out_edges(v)? {
                let target = self.graph.edge(e)?.target;
                if verts.contains(&target) {
                    return Ok(false);
                }
                if seen.insert(target) {
                    stack.push(target);
                }
            }
        }
        Ok(true)
    }

    /// Describe the region spanned by `verts`.
    ///
    /// Slots are ordered by the host unit in canonical order. Fails if the
    /// region contains boundary vertices or is not convex.
    pub fn subcircuit(&self, verts: &BTreeSet<Vertex>) -> CircuitResult<Subcircuit> {
        let mut crossings: BTreeMap<UnitId, UnitCrossing> = BTreeMap::new();
        let mut b_future = Vec::new();
        for &v in verts {
            if self.graph.kind(v)?.is_boundary() {
                return Err(CircuitError::invalid(
                    "Subcircuit cannot contain boundary vertices",
                ));
            }
        }
        if !self.is_convex(verts)? {
            return Err(CircuitError::invalid(
                "Subcircuit is not convex: a path leaves it and re-enters",
            ));
        }
        for &v in verts {
            for e in self.graph.in_edges(v)? {
                let info = self.graph.edge(e)?;
                if verts.contains(&info.source) {
                    continue;
                }
                let unit = self.edge_unit(e)?;
                let crossing = crossings.entry(unit.clone()).or_default();
                if !info.kind.is_linear() {
                    crossing.reads.push(e);
                    continue;
                }
                if crossing.linear.is_some() {
                    return Err(CircuitError::invalid(format!(
                        "Subcircuit is not convex: {unit} enters it twice"
                    )));
                }
                let (mut current, mut port) = (v, info.target_port);
                let exit = loop {
                    let out = self.graph.out_edge(current, port)?;
                    let next = self.graph.edge(out)?;
                    if !verts.contains(&next.target) {
                        break out;
                    }
                    current = next.target;
                    port = next.target_port;
                };
                crossing.linear = Some((e, exit));
            }
            for e in self.graph.out_edges(v)? {
                let info = self.graph.edge(e)?;
                if info.kind == WireKind::Boolean && !verts.contains(&info.target) {
                    b_future.push(e);
                }
            }
        }

        let mut hole = Subcircuit {
            b_future,
            verts: verts.clone(),
            ..Subcircuit::default()
        };
        for (unit, crossing) in crossings {
            let source = match crossing.linear {
                Some((entry, _)) => Some(entry),
                None => crossing.reads.first().copied(),
            };
            let Some(source) = source else { continue };
            let origin = self.graph.edge(source)?;
            for &read in &crossing.reads {
                let r = self.graph.edge(read)?;
                if (r.source, r.source_port) != (origin.source, origin.source_port) {
                    return Err(CircuitError::invalid(format!(
                        "Subcircuit is not convex: {unit} is read at two points"
                    )));
                }
            }
            hole.in_hole.push(source);
            hole.out_hole.push(crossing.linear.map(|(_, exit)| exit));
        }
        Ok(hole)
    }

    /// Describe the single-vertex region `{v}`.
    ///
    /// Slots follow the vertex's port order with quantum ports first, which
    /// lines up with the canonical unit order of a default-register
    /// replacement.
    pub fn singleton_subcircuit(&self, v: Vertex) -> CircuitResult<Subcircuit> {
        if self.graph.kind(v)?.is_boundary() {
            return Err(CircuitError::invalid(
                "Subcircuit cannot contain boundary vertices",
            ));
        }
        let mut ports: Vec<(u8, Port, WireKind, Edge)> = Vec::new();
        for e in self.graph.in_edges(v)? {
            let info = self.graph.edge(e)?;
            ports.push((slot_rank(info.kind), info.target_port, info.kind, e));
        }
        ports.sort_unstable_by_key(|&(rank, port, _, _)| (rank, port));

        let mut hole = Subcircuit {
            verts: BTreeSet::from([v]),
            ..Subcircuit::default()
        };
        for (_, port, kind, e) in ports {
            hole.in_hole.push(e);
            hole.out_hole.push(if kind.is_linear() {
                Some(self.graph.out_edge(v, port)?)
            } else {
                None
            });
        }
        hole.b_future = self.graph.out_edges_of_kind(v, WireKind::Boolean)?;
        Ok(hole)
    }
}

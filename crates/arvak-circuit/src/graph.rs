//! Handle-stable, port-addressed circuit graph.
//!
//! The graph is a [`StableDiGraph`] whose node and edge slots carry a
//! generation counter. [`Vertex`] and [`Edge`] handles pair a slot index with
//! the generation it was issued for, so a handle held across the deletion of
//! its node never silently aliases whatever later reuses the slot: lookups
//! fail with [`CircuitError::MissingVertex`] / [`CircuitError::MissingEdge`]
//! instead.
//!
//! ## Port model
//!
//! - A linear port `p` (Quantum, Classical, Wasm, Rng) has exactly one
//!   in-edge with target port `p` and one out-edge with source port `p`.
//! - A Boolean port `p` has one in-edge with target port `p`, originating at
//!   the classical out-port of the bit's last writer. It has no out-edge.
//! - A classical out-port fans out any number of Boolean edges alongside its
//!   single classical edge.

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use crate::error::{CircuitError, CircuitResult};
use crate::op::{OpRef, Signature, WireKind, op_label};

/// Port index on a node.
pub type Port = usize;

/// Generation-checked handle to a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vertex {
    index: NodeIndex<u32>,
    generation: u32,
}

impl Vertex {
    /// Raw slot index. Slots are reused after deletion.
    #[inline]
    pub fn index(&self) -> usize {
        self.index.index()
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}#{}", self.index.index(), self.generation)
    }
}

/// Generation-checked handle to a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    index: EdgeIndex<u32>,
    generation: u32,
}

/// Whether removing a node splices its predecessors to its successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphRewiring {
    /// Connect each linear predecessor to the matching successor.
    Yes,
    /// Drop incident edges without reconnecting.
    No,
}

/// Whether a removed node is deleted or left isolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexDeletion {
    /// Delete the node; its handle becomes stale.
    Yes,
    /// Keep the node without edges, for batched removal by the caller.
    No,
}

/// What a node holds: a boundary marker or an operation.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Start of a wire.
    Input(WireKind),
    /// End of a wire.
    Output(WireKind),
    /// Start of a qubit prepared in |0⟩.
    Create,
    /// End of a qubit whose final state is dropped.
    Discard,
    /// An operation.
    Op(OpRef),
}

impl NodeKind {
    /// Whether this is a boundary marker.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !matches!(self, NodeKind::Op(_))
    }

    /// Whether this is an Input or Create marker.
    #[inline]
    pub fn is_input_boundary(&self) -> bool {
        matches!(self, NodeKind::Input(_) | NodeKind::Create)
    }

    /// Whether this is an Output or Discard marker.
    #[inline]
    pub fn is_output_boundary(&self) -> bool {
        matches!(self, NodeKind::Output(_) | NodeKind::Discard)
    }

    /// The operation, if this is an operation node.
    #[inline]
    pub fn op(&self) -> Option<&OpRef> {
        match self {
            NodeKind::Op(op) => Some(op),
            _ => None,
        }
    }

    /// Wire kind expected on each port.
    pub fn signature(&self) -> Signature {
        match self {
            NodeKind::Input(kind) | NodeKind::Output(kind) => vec![*kind],
            NodeKind::Create | NodeKind::Discard => vec![WireKind::Quantum],
            NodeKind::Op(op) => op.signature(),
        }
    }

    /// Short human-readable label.
    pub fn label(&self) -> String {
        match self {
            NodeKind::Input(kind) => format!("input({kind})"),
            NodeKind::Output(kind) => format!("output({kind})"),
            NodeKind::Create => "create".to_string(),
            NodeKind::Discard => "discard".to_string(),
            NodeKind::Op(op) => op_label(op.as_ref()),
        }
    }
}

/// A graph node: its content plus an optional opgroup label.
#[derive(Debug, Clone)]
pub struct Node {
    /// Boundary marker or operation.
    pub kind: NodeKind,
    /// User label correlating nodes for bulk replacement.
    pub opgroup: Option<String>,
}

/// Resolved endpoints and kind of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeInfo {
    /// Source node.
    pub source: Vertex,
    /// Out-port on the source node.
    pub source_port: Port,
    /// Target node.
    pub target: Vertex,
    /// In-port on the target node.
    pub target_port: Port,
    /// Kind of data carried.
    pub kind: WireKind,
}

#[derive(Debug, Clone)]
struct NodeSlot {
    node: Node,
    generation: u32,
    seq: u64,
}

#[derive(Debug, Clone)]
struct EdgeSlot {
    kind: WireKind,
    source_port: Port,
    target_port: Port,
    generation: u32,
}

fn slot_generation(generations: &mut Vec<u32>, index: usize) -> u32 {
    if generations.len() <= index {
        generations.resize(index + 1, 0);
    }
    generations[index]
}

fn retire(generations: &mut [u32], index: usize) {
    if let Some(generation) = generations.get_mut(index) {
        *generation = generation.wrapping_add(1);
    }
}

/// Port-addressed DAG of boundary and operation nodes.
#[derive(Debug, Clone, Default)]
pub struct CircuitGraph {
    graph: StableDiGraph<NodeSlot, EdgeSlot, u32>,
    node_generations: Vec<u32>,
    edge_generations: Vec<u32>,
    /// Next sequence index; never reused.
    next_seq: u64,
}

impl CircuitGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Add a node and return its handle.
    pub fn add_vertex(&mut self, kind: NodeKind, opgroup: Option<String>) -> Vertex {
        let seq = self.next_seq;
        self.next_seq += 1;
        let index = self.graph.add_node(NodeSlot {
            node: Node { kind, opgroup },
            generation: 0,
            seq,
        });
        let generation = slot_generation(&mut self.node_generations, index.index());
        self.graph[index].generation = generation;
        Vertex { index, generation }
    }

    /// Add a boundary pair joined by a single wire.
    pub fn add_wire(
        &mut self,
        start: NodeKind,
        end: NodeKind,
        kind: WireKind,
    ) -> (Vertex, Vertex) {
        let input = self.add_vertex(start, None);
        let output = self.add_vertex(end, None);
        let index = self.graph.add_edge(
            input.index,
            output.index,
            EdgeSlot {
                kind,
                source_port: 0,
                target_port: 0,
                generation: 0,
            },
        );
        let generation = slot_generation(&mut self.edge_generations, index.index());
        self.graph[index].generation = generation;
        (input, output)
    }

    fn slot(&self, v: Vertex) -> CircuitResult<&NodeSlot> {
        self.graph
            .node_weight(v.index)
            .filter(|slot| slot.generation == v.generation)
            .ok_or(CircuitError::MissingVertex)
    }

    fn slot_mut(&mut self, v: Vertex) -> CircuitResult<&mut NodeSlot> {
        self.graph
            .node_weight_mut(v.index)
            .filter(|slot| slot.generation == v.generation)
            .ok_or(CircuitError::MissingVertex)
    }

    fn vertex_handle(&self, index: NodeIndex<u32>) -> Vertex {
        Vertex {
            index,
            generation: self.graph[index].generation,
        }
    }

    /// Whether the handle refers to a live node.
    #[inline]
    pub fn contains_vertex(&self, v: Vertex) -> bool {
        self.slot(v).is_ok()
    }

    /// The node behind a handle.
    pub fn node(&self, v: Vertex) -> CircuitResult<&Node> {
        self.slot(v).map(|slot| &slot.node)
    }

    /// Content of a node.
    pub fn kind(&self, v: Vertex) -> CircuitResult<&NodeKind> {
        self.slot(v).map(|slot| &slot.node.kind)
    }

    /// Replace the content of a node, keeping its edges.
    pub fn set_kind(&mut self, v: Vertex, kind: NodeKind) -> CircuitResult<()> {
        self.slot_mut(v)?.node.kind = kind;
        Ok(())
    }

    /// Opgroup label of a node.
    pub fn opgroup(&self, v: Vertex) -> CircuitResult<Option<&str>> {
        self.slot(v).map(|slot| slot.node.opgroup.as_deref())
    }

    /// Set or clear the opgroup label of a node.
    pub fn set_opgroup(&mut self, v: Vertex, opgroup: Option<String>) -> CircuitResult<()> {
        self.slot_mut(v)?.node.opgroup = opgroup;
        Ok(())
    }

    /// Creation order of a node, unique over the graph's lifetime.
    pub fn sequence_index(&self, v: Vertex) -> CircuitResult<u64> {
        self.slot(v).map(|slot| slot.seq)
    }

    /// All live nodes, in slot order.
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.graph.node_indices().map(|i| self.vertex_handle(i))
    }

    /// All live nodes, in creation order.
    pub fn vertices_by_sequence(&self) -> Vec<Vertex> {
        let mut vertices: Vec<_> = self
            .graph
            .node_indices()
            .map(|i| (self.graph[i].seq, self.vertex_handle(i)))
            .collect();
        vertices.sort_unstable_by_key(|(seq, _)| *seq);
        vertices.into_iter().map(|(_, v)| v).collect()
    }

    /// Number of live nodes.
    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of live edges.
    #[inline]
    pub fn n_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Remove a node.
    ///
    /// With [`GraphRewiring::Yes`], each non-Boolean in-edge at port `p` is
    /// reconnected to the target of the out-edge at port `p`; Boolean reads
    /// hanging off a classical port move to the predecessor. Boolean in-edges
    /// of the removed node are dropped either way.
    pub fn remove_vertex(
        &mut self,
        v: Vertex,
        rewiring: GraphRewiring,
        deletion: VertexDeletion,
    ) -> CircuitResult<()> {
        self.slot(v)?;
        if rewiring == GraphRewiring::Yes {
            for e in self.in_edges(v)? {
                let incoming = self.edge(e)?;
                if !incoming.kind.is_linear() {
                    continue;
                }
                let pred = (incoming.source, incoming.source_port);
                let outgoing = self.edge(self.out_edge(v, incoming.target_port)?)?;
                self.add_edge(
                    pred,
                    (outgoing.target, outgoing.target_port),
                    incoming.kind,
                )?;
                if incoming.kind == WireKind::Classical {
                    for b in self.boolean_out_edges(v, incoming.target_port)? {
                        let read = self.edge(b)?;
                        self.add_edge(pred, (read.target, read.target_port), WireKind::Boolean)?;
                    }
                }
            }
        }
        self.isolate_vertex(v)?;
        if deletion == VertexDeletion::Yes {
            self.graph.remove_node(v.index);
            retire(&mut self.node_generations, v.index.index());
        }
        Ok(())
    }

    /// Remove every edge incident to a node.
    pub fn isolate_vertex(&mut self, v: Vertex) -> CircuitResult<()> {
        self.slot(v)?;
        let incident: Vec<EdgeIndex<u32>> = self
            .graph
            .edges_directed(v.index, Direction::Incoming)
            .chain(self.graph.edges_directed(v.index, Direction::Outgoing))
            .map(|e| e.id())
            .collect();
        for index in incident {
            self.graph.remove_edge(index);
            retire(&mut self.edge_generations, index.index());
        }
        Ok(())
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Connect `source` out-port to `target` in-port.
    pub fn add_edge(
        &mut self,
        (source, source_port): (Vertex, Port),
        (target, target_port): (Vertex, Port),
        kind: WireKind,
    ) -> CircuitResult<Edge> {
        self.slot(source)?;
        self.slot(target)?;
        let index = self.graph.add_edge(
            source.index,
            target.index,
            EdgeSlot {
                kind,
                source_port,
                target_port,
                generation: 0,
            },
        );
        let generation = slot_generation(&mut self.edge_generations, index.index());
        self.graph[index].generation = generation;
        Ok(Edge { index, generation })
    }

    fn edge_slot(&self, e: Edge) -> CircuitResult<&EdgeSlot> {
        self.graph
            .edge_weight(e.index)
            .filter(|slot| slot.generation == e.generation)
            .ok_or(CircuitError::MissingEdge)
    }

    fn edge_handle(&self, index: EdgeIndex<u32>) -> Edge {
        Edge {
            index,
            generation: self.graph[index].generation,
        }
    }

    /// Whether the handle refers to a live edge.
    #[inline]
    pub fn contains_edge(&self, e: Edge) -> bool {
        self.edge_slot(e).is_ok()
    }

    /// Endpoints, ports and kind of an edge.
    pub fn edge(&self, e: Edge) -> CircuitResult<EdgeInfo> {
        let slot = self.edge_slot(e)?;
        let (source, target) = self
            .graph
            .edge_endpoints(e.index)
            .ok_or(CircuitError::MissingEdge)?;
        Ok(EdgeInfo {
            source: self.vertex_handle(source),
            source_port: slot.source_port,
            target: self.vertex_handle(target),
            target_port: slot.target_port,
            kind: slot.kind,
        })
    }

    /// Remove an edge, returning what it connected.
    pub fn remove_edge(&mut self, e: Edge) -> CircuitResult<EdgeInfo> {
        let info = self.edge(e)?;
        self.graph.remove_edge(e.index);
        retire(&mut self.edge_generations, e.index.index());
        Ok(info)
    }

    /// All live edges.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.graph.edge_indices().map(|i| self.edge_handle(i))
    }

    /// In-edges of a node, ordered by target port.
    pub fn in_edges(&self, v: Vertex) -> CircuitResult<Vec<Edge>> {
        self.slot(v)?;
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(v.index, Direction::Incoming)
            .map(|e| (e.weight().target_port, self.edge_handle(e.id())))
            .collect();
        edges.sort_unstable();
        Ok(edges.into_iter().map(|(_, e)| e).collect())
    }

    /// Out-edges of a node, ordered by source port; at a shared port the
    /// linear edge precedes Boolean reads.
    pub fn out_edges(&self, v: Vertex) -> CircuitResult<Vec<Edge>> {
        self.slot(v)?;
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(v.index, Direction::Outgoing)
            .map(|e| {
                let w = e.weight();
                ((w.source_port, w.kind == WireKind::Boolean), self.edge_handle(e.id()))
            })
            .collect();
        edges.sort_unstable();
        Ok(edges.into_iter().map(|(_, e)| e).collect())
    }

    /// The in-edge at a given port.
    pub fn in_edge(&self, v: Vertex, port: Port) -> CircuitResult<Edge> {
        self.slot(v)?;
        self.graph
            .edges_directed(v.index, Direction::Incoming)
            .find(|e| e.weight().target_port == port)
            .map(|e| self.edge_handle(e.id()))
            .ok_or(CircuitError::MissingEdge)
    }

    /// The linear out-edge at a given port.
    pub fn out_edge(&self, v: Vertex, port: Port) -> CircuitResult<Edge> {
        self.slot(v)?;
        self.graph
            .edges_directed(v.index, Direction::Outgoing)
            .find(|e| e.weight().source_port == port && e.weight().kind.is_linear())
            .map(|e| self.edge_handle(e.id()))
            .ok_or(CircuitError::MissingEdge)
    }

    /// Boolean reads fanning out of a classical port.
    pub fn boolean_out_edges(&self, v: Vertex, port: Port) -> CircuitResult<Vec<Edge>> {
        Ok(self
            .out_edges(v)?
            .into_iter()
            .filter(|&e| {
                self.edge_slot(e)
                    .is_ok_and(|w| w.source_port == port && w.kind == WireKind::Boolean)
            })
            .collect())
    }

    /// In-edges of one kind, ordered by port.
    pub fn in_edges_of_kind(&self, v: Vertex, kind: WireKind) -> CircuitResult<Vec<Edge>> {
        Ok(self
            .in_edges(v)?
            .into_iter()
            .filter(|&e| self.edge_slot(e).is_ok_and(|w| w.kind == kind))
            .collect())
    }

    /// Out-edges of one kind, ordered by port.
    pub fn out_edges_of_kind(&self, v: Vertex, kind: WireKind) -> CircuitResult<Vec<Edge>> {
        Ok(self
            .out_edges(v)?
            .into_iter()
            .filter(|&e| self.edge_slot(e).is_ok_and(|w| w.kind == kind))
            .collect())
    }

    // ========================================================================
    // Order
    // ========================================================================

    /// Read-before-overwrite constraints as `(reader, next_writer)` pairs.
    ///
    /// A Boolean read of a classical port must happen before the node on the
    /// other end of that port's classical edge overwrites the bit. These
    /// pairs are not edges of the graph, so every ordering walk adds them.
    pub fn read_write_hazards(&self) -> Vec<(Vertex, Vertex)> {
        self.hazard_pairs()
            .into_iter()
            .map(|(r, w)| (self.vertex_handle(r), self.vertex_handle(w)))
            .collect()
    }

    fn hazard_pairs(&self) -> Vec<(NodeIndex<u32>, NodeIndex<u32>)> {
        let mut pairs = Vec::new();
        for e in self.graph.edge_references() {
            let read = e.weight();
            if read.kind != WireKind::Boolean {
                continue;
            }
            let writer = self
                .graph
                .edges_directed(e.source(), Direction::Outgoing)
                .find(|c| {
                    c.weight().kind == WireKind::Classical
                        && c.weight().source_port == read.source_port
                });
            if let Some(c) = writer {
                if c.target() != e.target() {
                    pairs.push((e.target(), c.target()));
                }
            }
        }
        pairs
    }

    /// Topological order, ties broken by sequence index. Readers of a bit
    /// come before its next writer.
    pub fn topological_order(&self) -> CircuitResult<Vec<Vertex>> {
        let mut hazards: FxHashMap<NodeIndex<u32>, Vec<NodeIndex<u32>>> = FxHashMap::default();
        let mut blocked: FxHashMap<NodeIndex<u32>, usize> = FxHashMap::default();
        for (r, w) in self.hazard_pairs() {
            hazards.entry(r).or_default().push(w);
            *blocked.entry(w).or_default() += 1;
        }
        let mut indegree: FxHashMap<NodeIndex<u32>, usize> = FxHashMap::default();
        let mut ready = BinaryHeap::new();
        for i in self.graph.node_indices() {
            let d = self.graph.edges_directed(i, Direction::Incoming).count()
                + blocked.get(&i).copied().unwrap_or(0);
            if d == 0 {
                ready.push(Reverse((self.graph[i].seq, i)));
            } else {
                indegree.insert(i, d);
            }
        }
        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((_, i))) = ready.pop() {
            order.push(self.vertex_handle(i));
            let successors = self
                .graph
                .edges_directed(i, Direction::Outgoing)
                .map(|e| e.target())
                .chain(hazards.get(&i).into_iter().flatten().copied());
            for t in successors {
                if let Some(d) = indegree.get_mut(&t) {
                    *d -= 1;
                    if *d == 0 {
                        indegree.remove(&t);
                        ready.push(Reverse((self.graph[t].seq, t)));
                    }
                }
            }
        }
        if order.len() != self.graph.node_count() {
            return Err(CircuitError::invalid("Circuit graph contains a cycle"));
        }
        Ok(order)
    }

    /// Whether the graph has no directed cycle.
    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;

    fn op(gate: StandardGate) -> NodeKind {
        NodeKind::Op(gate.into_op())
    }

    /// in -> h -> out on one qubit.
    fn line() -> (CircuitGraph, Vertex, Vertex, Vertex) {
        let mut g = CircuitGraph::new();
        let i = g.add_vertex(NodeKind::Input(WireKind::Quantum), None);
        let h = g.add_vertex(op(StandardGate::H), None);
        let o = g.add_vertex(NodeKind::Output(WireKind::Quantum), None);
        g.add_edge((i, 0), (h, 0), WireKind::Quantum).unwrap();
        g.add_edge((h, 0), (o, 0), WireKind::Quantum).unwrap();
        (g, i, h, o)
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let (mut g, _, h, _) = line();
        g.remove_vertex(h, GraphRewiring::Yes, VertexDeletion::Yes).unwrap();
        let x = g.add_vertex(op(StandardGate::X), None);
        assert_eq!(x.index(), h.index());
        assert!(matches!(g.node(h), Err(CircuitError::MissingVertex)));
        assert_eq!(g.kind(x).unwrap().label(), "x");
    }

    #[test]
    fn test_handles_survive_unrelated_removal() {
        let (mut g, i, h, o) = line();
        let extra = g.add_vertex(op(StandardGate::Z), None);
        g.remove_vertex(extra, GraphRewiring::No, VertexDeletion::Yes).unwrap();
        assert!(g.contains_vertex(i));
        assert!(g.contains_vertex(h));
        assert!(g.contains_vertex(o));
        assert_eq!(g.out_edges(h).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_with_rewiring() {
        let (mut g, i, h, o) = line();
        g.remove_vertex(h, GraphRewiring::Yes, VertexDeletion::Yes).unwrap();
        let out = g.out_edges(i).unwrap();
        assert_eq!(out.len(), 1);
        let info = g.edge(out[0]).unwrap();
        assert_eq!(info.target, o);
        assert_eq!(info.kind, WireKind::Quantum);
        assert_eq!(g.n_vertices(), 2);
    }

    #[test]
    fn test_remove_without_deletion_isolates() {
        let (mut g, i, h, _) = line();
        g.remove_vertex(h, GraphRewiring::No, VertexDeletion::No).unwrap();
        assert!(g.contains_vertex(h));
        assert!(g.in_edges(h).unwrap().is_empty());
        assert!(g.out_edges(i).unwrap().is_empty());
    }

    #[test]
    fn test_stale_edge_handle() {
        let (mut g, i, _, _) = line();
        let e = g.out_edges(i).unwrap()[0];
        g.remove_edge(e).unwrap();
        assert!(matches!(g.edge(e), Err(CircuitError::MissingEdge)));
    }

    #[test]
    fn test_boolean_reads_rehomed_on_rewiring() {
        // cin -> w (classical writer) -> cout, with w's port 0 read by r.
        let mut g = CircuitGraph::new();
        let cin = g.add_vertex(NodeKind::Input(WireKind::Classical), None);
        let w = g.add_vertex(NodeKind::Input(WireKind::Classical), None);
        let cout = g.add_vertex(NodeKind::Output(WireKind::Classical), None);
        let r = g.add_vertex(op(StandardGate::X), None);
        g.add_edge((cin, 0), (w, 0), WireKind::Classical).unwrap();
        g.add_edge((w, 0), (cout, 0), WireKind::Classical).unwrap();
        g.add_edge((w, 0), (r, 0), WireKind::Boolean).unwrap();
        g.remove_vertex(w, GraphRewiring::Yes, VertexDeletion::Yes).unwrap();
        let reads = g.boolean_out_edges(cin, 0).unwrap();
        assert_eq!(reads.len(), 1);
        assert_eq!(g.edge(reads[0]).unwrap().target, r);
        assert_eq!(g.edge(g.out_edge(cin, 0).unwrap()).unwrap().target, cout);
    }

    #[test]
    fn test_reader_precedes_next_writer() {
        // w is created first but overwrites the bit that r reads from cin
        let mut g = CircuitGraph::new();
        let w = g.add_vertex(op(StandardGate::X), None);
        let cin = g.add_vertex(NodeKind::Input(WireKind::Classical), None);
        let cout = g.add_vertex(NodeKind::Output(WireKind::Classical), None);
        let r = g.add_vertex(op(StandardGate::Z), None);
        g.add_edge((cin, 0), (w, 0), WireKind::Classical).unwrap();
        g.add_edge((w, 0), (cout, 0), WireKind::Classical).unwrap();
        g.add_edge((cin, 0), (r, 0), WireKind::Boolean).unwrap();
        assert_eq!(g.read_write_hazards(), vec![(r, w)]);
        assert_eq!(g.topological_order().unwrap(), vec![cin, r, w, cout]);
    }

    #[test]
    fn test_topological_ties_follow_sequence() {
        let mut g = CircuitGraph::new();
        let a = g.add_vertex(op(StandardGate::X), None);
        let b = g.add_vertex(op(StandardGate::Z), None);
        let c = g.add_vertex(op(StandardGate::H), None);
        g.add_edge((c, 0), (a, 0), WireKind::Quantum).unwrap();
        let order = g.topological_order().unwrap();
        assert_eq!(order, vec![b, c, a]);
        assert!(g.is_acyclic());
        g.add_edge((a, 0), (c, 0), WireKind::Quantum).unwrap();
        assert!(!g.is_acyclic());
        assert!(g.topological_order().is_err());
    }
}

//! Device coupling maps.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Target device coupling map.
///
/// Physical qubits are numbered `0..num_qubits` and correspond to the
/// `node[i]` units of a placed circuit. Edges are undirected.
///
/// ## Deserialization
///
/// The adjacency list is skipped during serialization. Call
/// [`rebuild_caches()`](Self::rebuild_caches) after deserializing; the
/// predicate registry does this for you.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingMap {
    /// List of connected qubit pairs (bidirectional).
    edges: Vec<(u32, u32)>,
    /// Number of physical qubits.
    num_qubits: u32,
    /// Adjacency list for fast lookup.
    #[serde(skip)]
    adjacency: FxHashMap<u32, Vec<u32>>,
}

impl CouplingMap {
    /// Create a coupling map with no edges.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            edges: vec![],
            num_qubits,
            adjacency: FxHashMap::default(),
        }
    }

    /// Add an edge between two qubits (bidirectional).
    ///
    /// Duplicate edges (including reversed pairs) are ignored. The node
    /// count grows to cover both endpoints.
    pub fn add_edge(&mut self, q1: u32, q2: u32) {
        if self.is_connected(q1, q2) {
            return;
        }
        self.num_qubits = self.num_qubits.max(q1.max(q2) + 1);
        self.edges.push((q1, q2));
        self.adjacency.entry(q1).or_default().push(q2);
        self.adjacency.entry(q2).or_default().push(q1);
    }

    /// Rebuild the adjacency list from the edge list.
    pub fn rebuild_caches(&mut self) {
        self.adjacency.clear();
        for &(q1, q2) in &self.edges {
            self.adjacency.entry(q1).or_default().push(q2);
            self.adjacency.entry(q2).or_default().push(q1);
        }
    }

    /// Check if two qubits are directly connected.
    #[inline]
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        self.adjacency
            .get(&q1)
            .is_some_and(|neighbors| neighbors.contains(&q2))
    }

    /// Whether `qubit` is a node of the device.
    #[inline]
    pub fn contains_node(&self, qubit: u32) -> bool {
        qubit < self.num_qubits
    }

    /// Get the number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the coupling edges.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Whether every node and edge of this map also exists in `other`.
    pub fn is_subgraph_of(&self, other: &CouplingMap) -> bool {
        self.num_qubits <= other.num_qubits
            && self
                .edges
                .iter()
                .all(|&(a, b)| other.is_connected(a, b))
    }

    /// The edges present in both maps, over the smaller node set.
    pub fn intersection(&self, other: &CouplingMap) -> CouplingMap {
        let mut map = CouplingMap::new(self.num_qubits.min(other.num_qubits));
        for &(a, b) in &self.edges {
            if other.is_connected(a, b) {
                map.add_edge(a, b);
            }
        }
        map
    }

    /// Create a linear coupling map (0-1-2-3-...).
    pub fn linear(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n.saturating_sub(1) {
            map.add_edge(i, i + 1);
        }
        map
    }

    /// Create a fully connected coupling map.
    pub fn full(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                map.add_edge(i, j);
            }
        }
        map
    }

    /// Create a star topology (center qubit connected to all others).
    pub fn star(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 1..n {
            map.add_edge(0, i);
        }
        map
    }
}

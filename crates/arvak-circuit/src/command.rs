//! The commands view: operations with their unit arguments in a valid
//! topological order.

use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use crate::builtin::{as_conditional, conditional_label};
use crate::circuit::Circuit;
use crate::graph::{Port, Vertex};
use crate::op::{OpRef, op_label};
use crate::unit::UnitId;

/// One operation applied to concrete units.
#[derive(Debug, Clone)]
pub struct Command {
    /// The operation.
    pub op: OpRef,
    /// Units bound to each port, in port order.
    pub args: Vec<UnitId>,
    /// Opgroup label of the vertex.
    pub opgroup: Option<String>,
    /// Vertex the command was read from.
    pub vertex: Vertex,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match as_conditional(self.op.as_ref()) {
            Some(cond) => f.write_str(&conditional_label(cond))?,
            None => f.write_str(&op_label(self.op.as_ref()))?,
        }
        for (i, unit) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{unit}")?;
        }
        f.write_str(";")
    }
}

/// Lazy topological walk over a circuit's operations.
///
/// Ties are broken by vertex sequence index, so the order is deterministic
/// for a given construction history. A writer of a classical bit waits for
/// every pending Boolean read of the bit's previous value. Call
/// [`Circuit::commands`] again to restart.
pub struct Commands<'a> {
    circuit: &'a Circuit,
    ready: BinaryHeap<Reverse<(u64, Vertex)>>,
    pending: FxHashMap<Vertex, usize>,
    /// Next writers held back by each reader.
    hazards: FxHashMap<Vertex, Vec<Vertex>>,
    wires: FxHashMap<(Vertex, Port), UnitId>,
}

impl<'a> Commands<'a> {
    fn new(circuit: &'a Circuit) -> Self {
        let graph = &circuit.graph;
        let mut hazards: FxHashMap<Vertex, Vec<Vertex>> = FxHashMap::default();
        let mut blocked: FxHashMap<Vertex, usize> = FxHashMap::default();
        for (reader, writer) in graph.read_write_hazards() {
            hazards.entry(reader).or_default().push(writer);
            *blocked.entry(writer).or_default() += 1;
        }
        let mut ready = BinaryHeap::new();
        let mut pending = FxHashMap::default();
        for v in graph.vertices() {
            let degree = graph.in_edges(v).map(|e| e.len()).unwrap_or(0)
                + blocked.get(&v).copied().unwrap_or(0);
            if degree == 0 {
                if let Ok(seq) = graph.sequence_index(v) {
                    ready.push(Reverse((seq, v)));
                }
            } else {
                pending.insert(v, degree);
            }
        }
        let wires = circuit
            .boundary
            .iter()
            .map(|(unit, entry)| ((entry.input, 0), unit.clone()))
            .collect();
        Self {
            circuit,
            ready,
            pending,
            hazards,
            wires,
        }
    }

    fn release_successors(&mut self, v: Vertex) {
        let graph = &self.circuit.graph;
        let targets: Vec<Vertex> = graph
            .out_edges(v)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|e| graph.edge(e).ok().map(|info| info.target))
            .chain(self.hazards.remove(&v).unwrap_or_default())
            .collect();
        for target in targets {
            if let Some(degree) = self.pending.get_mut(&target) {
                *degree -= 1;
                if *degree == 0 {
                    self.pending.remove(&target);
                    if let Ok(seq) = graph.sequence_index(target) {
                        self.ready.push(Reverse((seq, target)));
                    }
                }
            }
        }
    }
}

impl Iterator for Commands<'_> {
    type Item = Command;

    fn next(&mut self) -> Option<Command> {
        while let Some(Reverse((_, v))) = self.ready.pop() {
            self.release_successors(v);
            let graph = &self.circuit.graph;
            let Ok(node) = graph.node(v) else { continue };
            let Some(op) = node.kind.op() else { continue };
            let sig = op.signature();
            let ins = graph.in_edges(v).unwrap_or_default();
            // Isolated leftovers of a batched removal.
            if ins.len() != sig.len() {
                continue;
            }
            let mut args = Vec::with_capacity(sig.len());
            for e in ins {
                let Ok(info) = graph.edge(e) else { break };
                let Some(unit) = self.wires.get(&(info.source, info.source_port)) else {
                    break;
                };
                args.push(unit.clone());
                if info.kind.is_linear() {
                    self.wires.insert((v, info.target_port), unit.clone());
                }
            }
            if args.len() != sig.len() {
                continue;
            }
            return Some(Command {
                op: op.clone(),
                args,
                opgroup: node.opgroup.clone(),
                vertex: v,
            });
        }
        None
    }
}

impl Circuit {
    /// Operations in topological order with their unit arguments.
    pub fn commands(&self) -> Commands<'_> {
        Commands::new(self)
    }

    /// All commands, collected.
    pub fn get_commands(&self) -> Vec<Command> {
        self.commands().collect()
    }
}

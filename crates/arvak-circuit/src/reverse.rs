//! Circuit dagger and transpose.

use tracing::warn;

use crate::circuit::{BoundaryEntry, Circuit};
use crate::error::{CircuitError, CircuitResult};
use crate::graph::NodeKind;
use crate::op::WireKind;
use crate::substitute::VertexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reversal {
    Dagger,
    Transpose,
}

impl Circuit {
    /// The inverse circuit.
    ///
    /// Inputs and outputs swap, every operation is replaced by its dagger,
    /// and the global phase is negated.
    pub fn dagger(&self) -> CircuitResult<Circuit> {
        self.reversed(Reversal::Dagger)
    }

    /// The transposed circuit.
    ///
    /// Like [`Circuit::dagger`] but with operation transposes, keeping the
    /// global phase.
    pub fn transpose(&self) -> CircuitResult<Circuit> {
        self.reversed(Reversal::Transpose)
    }

    fn reversed(&self, how: Reversal) -> CircuitResult<Circuit> {
        for unit in self.units() {
            if self.is_created(unit)? || self.is_discarded(unit)? {
                return Err(CircuitError::unsupported(
                    "Cannot reverse a circuit with created or discarded qubits",
                ));
            }
            if unit.is_bit() {
                warn!(%unit, "reversing a circuit with classical wires");
            }
        }

        let mut rev = Circuit::new();
        rev.name = self.name.clone();
        rev.opgroups = self.opgroups.clone();
        let mut isomap = VertexMap::default();
        // Reverse creation order keeps tie-breaks mirrored in the commands.
        for v in self.graph.vertices_by_sequence().into_iter().rev() {
            let node = self.graph.node(v)?;
            let kind = match &node.kind {
                NodeKind::Input(k) => NodeKind::Output(*k),
                NodeKind::Output(k) => NodeKind::Input(*k),
                NodeKind::Op(op) => NodeKind::Op(match how {
                    Reversal::Dagger => op.dagger()?,
                    Reversal::Transpose => op.transpose()?,
                }),
                NodeKind::Create | NodeKind::Discard => {
                    return Err(CircuitError::unsupported(
                        "Cannot reverse a circuit with created or discarded qubits",
                    ));
                }
            };
            isomap.insert(v, rev.graph.add_vertex(kind, node.opgroup.clone()));
        }
        for e in self.graph.edges() {
            let info = self.graph.edge(e)?;
            if info.kind == WireKind::Boolean {
                return Err(CircuitError::unsupported(
                    "Cannot reverse a circuit with Boolean reads",
                ));
            }
            let source = isomap
                .get(&info.target)
                .copied()
                .ok_or(CircuitError::MissingVertex)?;
            let target = isomap
                .get(&info.source)
                .copied()
                .ok_or(CircuitError::MissingVertex)?;
            rev.graph
                .add_edge((source, info.target_port), (target, info.source_port), info.kind)?;
        }
        for (unit, entry) in &self.boundary {
            let input = isomap
                .get(&entry.output)
                .copied()
                .ok_or(CircuitError::MissingVertex)?;
            let output = isomap
                .get(&entry.input)
                .copied()
                .ok_or(CircuitError::MissingVertex)?;
            rev.boundary
                .insert(unit.clone(), BoundaryEntry { input, output });
        }
        rev.phase = match how {
            Reversal::Dagger => -self.phase.clone(),
            Reversal::Transpose => self.phase.clone(),
        };
        Ok(rev)
    }
}

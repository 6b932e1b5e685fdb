//! Sequential and parallel composition.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::builtin::Reset;
use crate::circuit::{BoundaryEntry, Circuit};
use crate::error::{CircuitError, CircuitResult};
use crate::graph::{GraphRewiring, NodeKind, VertexDeletion};
use crate::substitute::{BoundaryMerge, OpGroupTransfer};
use crate::unit::UnitId;

impl Circuit {
    /// Append `other` after this circuit, tying units with equal ids.
    pub fn append(&mut self, other: &Circuit) -> CircuitResult<()> {
        self.append_with_map(other, &BTreeMap::new())
    }

    /// Append `other` after this circuit, renaming its units through `map`
    /// first.
    ///
    /// | this side | other side | join |
    /// |-----------|------------|------|
    /// | Output | Input | plain wire |
    /// | Output | Create | Reset |
    /// | Discard | Create | Reset |
    /// | Discard | Input | error |
    ///
    /// Units present on one side only pass through. Phases add.
    pub fn append_with_map(
        &mut self,
        other: &Circuit,
        map: &BTreeMap<UnitId, UnitId>,
    ) -> CircuitResult<()> {
        let mut copy = other.clone();
        copy.rename_units(map)?;

        for (unit, entry) in &copy.boundary {
            match self.boundary.get(unit) {
                Some(host) => {
                    let created = matches!(copy.graph.kind(entry.input)?, NodeKind::Create);
                    let discarded = matches!(self.graph.kind(host.output)?, NodeKind::Discard);
                    if discarded && !created {
                        return Err(CircuitError::invalid(
                            "Cannot append input qubit to discarded qubit",
                        ));
                    }
                }
                None => self.check_register(unit)?,
            }
        }

        let isomap = self.copy_graph(&copy, BoundaryMerge::No, OpGroupTransfer::Merge)?;
        let mut joined = 0usize;
        for (unit, entry) in &copy.boundary {
            let inp = isomap
                .get(&entry.input)
                .copied()
                .ok_or(CircuitError::MissingVertex)?;
            let outp = isomap
                .get(&entry.output)
                .copied()
                .ok_or(CircuitError::MissingVertex)?;
            let Some(host) = self.boundary.get(unit).copied() else {
                self.boundary.insert(
                    unit.clone(),
                    BoundaryEntry {
                        input: inp,
                        output: outp,
                    },
                );
                continue;
            };
            let last = self.graph.edge(self.graph.in_edge(host.output, 0)?)?;
            self.graph
                .add_edge((last.source, last.source_port), (inp, 0), last.kind)?;
            self.graph
                .remove_vertex(host.output, GraphRewiring::No, VertexDeletion::Yes)?;
            if matches!(self.graph.kind(inp)?, NodeKind::Create) {
                self.graph.set_kind(inp, NodeKind::Op(Arc::new(Reset)))?;
            } else {
                self.graph
                    .remove_vertex(inp, GraphRewiring::Yes, VertexDeletion::Yes)?;
            }
            self.boundary.insert(
                unit.clone(),
                BoundaryEntry {
                    input: host.input,
                    output: outp,
                },
            );
            joined += 1;
        }
        self.add_phase(other.phase.clone());
        debug!(joined, units = self.n_units(), "appended circuit");
        Ok(())
    }

    /// `c1` followed by `c2`, as a new circuit.
    pub fn sequential(c1: &Circuit, c2: &Circuit) -> CircuitResult<Circuit> {
        let mut result = c1.clone();
        result.append(c2)?;
        Ok(result)
    }

    /// `c1` and `c2` side by side. Fails if they share a unit.
    pub fn parallel(c1: &Circuit, c2: &Circuit) -> CircuitResult<Circuit> {
        let mut result = c1.clone();
        result.copy_graph(c2, BoundaryMerge::Yes, OpGroupTransfer::Merge)?;
        result.add_phase(c2.phase.clone());
        Ok(result)
    }
}

//! Arvak Circuit Graph and Rewriting Core
//!
//! This crate provides the circuit representation that the Arvak pass
//! framework rewrites: a port-addressed DAG of boundary markers and
//! operations, with handles that stay valid across unrelated deletions.
//!
//! # Overview
//!
//! A [`Circuit`] is a [`CircuitGraph`] plus a boundary mapping every
//! [`UnitId`] to one Input/Create and one Output/Discard vertex, and a
//! symbolic global phase. Operations are open-ended: anything implementing
//! [`Operation`] can be placed on a vertex.
//!
//! # Core Components
//!
//! - **Units**: [`UnitId`] names a qubit, bit or resource channel
//! - **Operations**: [`Operation`], [`StandardGate`], and the built-ins in
//!   [`builtin`] (measure, reset, barrier, phase, conditional)
//! - **Graph**: [`CircuitGraph`] with generation-checked [`Vertex`] and
//!   [`Edge`] handles
//! - **Commands**: [`Circuit::commands`] walks operations in topological order
//! - **Rewriting**: [`Subcircuit`] holes, [`Circuit::substitute`],
//!   [`Circuit::append`], [`Circuit::dagger`] and friends
//!
//! # Example: Replacing a Gate
//!
//! ```rust
//! use arvak_circuit::{Circuit, OpGroupTransfer, VertexDeletion};
//!
//! let mut circuit = Circuit::with_units(2, 0);
//! circuit.h(0).unwrap().cx(0, 1).unwrap();
//! let cx = circuit.get_commands()[1].vertex;
//!
//! // CX as H·CZ·H on the target
//! let mut replacement = Circuit::with_units(2, 0);
//! replacement.h(1).unwrap();
//! replacement
//!     .apply(arvak_circuit::StandardGate::CZ.into_op(), &[
//!         arvak_circuit::UnitId::qubit(0),
//!         arvak_circuit::UnitId::qubit(1),
//!     ])
//!     .unwrap();
//! replacement.h(1).unwrap();
//!
//! circuit
//!     .substitute_vertex(&replacement, cx, VertexDeletion::Yes, OpGroupTransfer::Preserve)
//!     .unwrap();
//! assert_eq!(circuit.n_ops(), 4);
//! assert!(!circuit.graph().contains_vertex(cx));
//! ```
//!
//! # Example: Composition
//!
//! ```rust
//! use arvak_circuit::Circuit;
//!
//! let mut prep = Circuit::with_units(2, 0);
//! prep.h(0).unwrap().cx(0, 1).unwrap();
//! let unprep = prep.dagger().unwrap();
//!
//! let round_trip = Circuit::sequential(&prep, &unprep).unwrap();
//! assert_eq!(round_trip.n_ops(), 4);
//! assert_eq!(round_trip.depth(), 4);
//! ```

pub mod builtin;
pub mod circuit;
pub mod command;
mod compose;
pub mod error;
pub mod gate;
pub mod graph;
pub mod op;
pub mod parameter;
mod reverse;
pub mod subcircuit;
pub mod substitute;
pub mod unit;

pub use builtin::{Barrier, Conditional, Measure, Phase, Reset};
pub use circuit::{BoundaryEntry, Circuit};
pub use command::{Command, Commands};
pub use error::{CircuitError, CircuitResult};
pub use gate::StandardGate;
pub use graph::{
    CircuitGraph, Edge, EdgeInfo, GraphRewiring, Node, NodeKind, Port, Vertex, VertexDeletion,
};
pub use op::{OpRef, Operation, Signature, WireKind, op_label};
pub use parameter::{ParameterExpression, SymbolMap, SymbolTable};
pub use subcircuit::Subcircuit;
pub use substitute::{BoundaryMerge, OpGroupTransfer, VertexMap};
pub use unit::{UnitId, UnitKind};

//! Arvak Pass Framework
//!
//! This crate wraps circuit rewrites from [`arvak_circuit`] in contracts so
//! that pipelines can be checked before they run and trusted while they run.
//!
//! # Overview
//!
//! A [`Predicate`] is a checkable property of a circuit with an
//! implication/meet algebra. A [`Pass`] declares the predicates it needs
//! (preconditions) and what it promises afterwards ([`PostConditions`]:
//! specific predicates that hold, plus a [`Guarantee`] of Clear or Preserve
//! per predicate kind). Passes run on a [`CompilationUnit`], which owns the
//! circuit, a cache of known predicate truths, and the unit maps that track
//! renamings.
//!
//! # Architecture
//!
//! ```text
//! PassManagerBuilder ──build()──► SequencePass ◄── match_passes (strict)
//!                                      │
//!       ┌──────────────────────────────┼─────────────────────────┐
//!       ▼                              ▼                         ▼
//! StandardPass                   RepeatPass         RepeatUntilSatisfied /
//! (transform + contract)                            RepeatWithMetric
//!       │
//!       ▼
//! CompilationUnit { circuit, targets, predicate cache, unit maps }
//! ```
//!
//! # Example: A Checked Pipeline
//!
//! ```rust
//! use std::sync::Arc;
//! use arvak_circuit::Circuit;
//! use arvak_passes::{
//!     CompilationUnit, NoBarriersPredicate, PassManagerBuilder, PredicatePtr,
//!     flatten_registers, remove_barriers,
//! };
//!
//! let mut circuit = Circuit::with_units(2, 0);
//! circuit.h(0).unwrap().barrier(&[0, 1]).unwrap().cx(0, 1).unwrap();
//! let mut cu =
//!     CompilationUnit::with_targets(circuit, [Arc::new(NoBarriersPredicate) as PredicatePtr]);
//!
//! let pm = PassManagerBuilder::new()
//!     .with_pass(remove_barriers())
//!     .with_pass(flatten_registers())
//!     .build()
//!     .unwrap();
//! assert!(pm.run(&mut cu).unwrap());
//! assert!(cu.check_all_predicates());
//! ```
//!
//! # Example: Rejecting an Impossible Sequence
//!
//! ```rust
//! use std::sync::Arc;
//! use arvak_passes::{
//!     CompileError, Guarantee, NoBarriersPredicate, PassPtr, PostConditions, SequencePass,
//!     StandardPass,
//! };
//!
//! let adds_barriers: PassPtr = Arc::new(
//!     StandardPass::new("AddBarriers", |_, _| Ok(false)).with_postconditions(
//!         PostConditions::preserve_all()
//!             .with_generic(NoBarriersPredicate::KIND, Guarantee::Clear),
//!     ),
//! );
//! let needs_no_barriers: PassPtr = Arc::new(
//!     StandardPass::new("NeedsNoBarriers", |_, _| Ok(false))
//!         .with_precondition(Arc::new(NoBarriersPredicate)),
//! );
//!
//! let result = SequencePass::new(vec![adds_barriers, needs_no_barriers]);
//! assert!(matches!(result, Err(CompileError::IncompatiblePasses { .. })));
//! ```
//!
//! # Custom Passes
//!
//! Most passes are a [`StandardPass`] around a closure that rewrites the
//! circuit and reports the renamings it made through [`UnitMaps`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use arvak_passes::{GateSetPredicate, Pass, PostConditions, StandardPass};
//!
//! let strip_idle = StandardPass::new("StripIdle", |circuit, maps| {
//!     let removed = circuit.remove_blank_wires()?;
//!     for unit in &removed {
//!         maps.remove_unit(unit);
//!     }
//!     Ok(!removed.is_empty())
//! })
//! .with_precondition(Arc::new(GateSetPredicate::new(["h", "cx"])))
//! .with_postconditions(PostConditions::preserve_all());
//! assert_eq!(strip_idle.name(), "StripIdle");
//! ```

pub mod combinator;
pub mod compilation_unit;
pub mod config;
pub mod contract;
pub mod coupling;
pub mod error;
pub mod library;
pub mod manager;
pub mod pass;
pub mod predicate;
pub mod predicates;
pub mod unit_maps;

pub use combinator::{
    Metric, RepeatPass, RepeatUntilSatisfiedPass, RepeatWithMetricPass, SequencePass,
};
pub use compilation_unit::{CompilationUnit, PredicateCache};
pub use config::{PassConstructor, PassRegistry, PredicateConstructor, PredicateRegistry};
pub use contract::{Guarantee, GuaranteeMap, PassConditions, PostConditions, match_passes};
pub use coupling::CouplingMap;
pub use error::{CompileError, CompileResult};
pub use library::{flatten_registers, remove_barriers, remove_blank_wires, rename_qubits};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Callbacks, Pass, PassCallback, PassPtr, SafetyMode, StandardPass, Transform};
pub use predicate::{Predicate, PredicateKind, PredicateMap, PredicatePtr, predicate_map};
pub use predicates::{
    ConnectivityPredicate, DefaultRegisterPredicate, GateSetPredicate, MaxNQubitsPredicate,
    MaxTwoQubitGatesPredicate, NoBarriersPredicate, NoClassicalBitsPredicate,
    NoClassicalControlPredicate, NoMidMeasurePredicate, NoSymbolsPredicate, UserDefinedPredicate,
    VerifyFn,
};
pub use unit_maps::{UnitBimap, UnitMaps};

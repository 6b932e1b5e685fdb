//! Rebuilding predicates and pass trees from their JSON configs.
//!
//! Predicates serialize as `{"type": <name>, ...params}` and passes as
//! `{"pass_class": <class>, <class>: {...}}`. Combinators are rebuilt
//! structurally; standard passes, predicates and metrics are looked up by
//! name in a registry.

use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use arvak_circuit::Circuit;

use crate::combinator::{
    Metric, RepeatPass, RepeatUntilSatisfiedPass, RepeatWithMetricPass, SequencePass,
};
use crate::coupling::CouplingMap;
use crate::error::{CompileError, CompileResult};
use crate::library;
use crate::pass::{PassPtr, StandardPass};
use crate::predicate::{Predicate, PredicatePtr};
use crate::predicates::{
    ConnectivityPredicate, DefaultRegisterPredicate, GateSetPredicate, MaxNQubitsPredicate,
    MaxTwoQubitGatesPredicate, NoBarriersPredicate, NoClassicalBitsPredicate,
    NoClassicalControlPredicate, NoMidMeasurePredicate, NoSymbolsPredicate,
};

/// Builds a predicate from its config.
pub type PredicateConstructor = Arc<dyn Fn(&Value) -> CompileResult<PredicatePtr> + Send + Sync>;

/// Builds a standard pass from the body of its config.
pub type PassConstructor = Arc<dyn Fn(&Value) -> CompileResult<StandardPass> + Send + Sync>;

fn field<'a>(value: &'a Value, key: &str) -> CompileResult<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| CompileError::config(format!("missing field \"{key}\"")))
}

fn str_field<'a>(value: &'a Value, key: &str) -> CompileResult<&'a str> {
    field(value, key)?
        .as_str()
        .ok_or_else(|| CompileError::config(format!("field \"{key}\" must be a string")))
}

// ============================================================================
// Predicates
// ============================================================================

/// Registry of predicate constructors keyed by predicate name.
pub struct PredicateRegistry {
    constructors: FxHashMap<String, PredicateConstructor>,
}

impl PredicateRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            constructors: FxHashMap::default(),
        }
    }

    /// A registry holding every serializable library predicate.
    pub fn with_library() -> Self {
        let mut registry = Self::new();
        registry.register(GateSetPredicate::KIND.name(), |value| {
            let allowed: Vec<String> =
                serde_json::from_value(field(value, "allowed_types")?.clone())?;
            Ok(Arc::new(GateSetPredicate::new(allowed)))
        });
        registry.register(MaxNQubitsPredicate::KIND.name(), |value| {
            let n = field(value, "n_qubits")?
                .as_u64()
                .ok_or_else(|| CompileError::config("n_qubits must be a non-negative integer"))?;
            let n = usize::try_from(n)
                .map_err(|_| CompileError::config("n_qubits does not fit in usize"))?;
            Ok(Arc::new(MaxNQubitsPredicate(n)))
        });
        registry.register(ConnectivityPredicate::KIND.name(), |value| {
            let mut coupling_map: CouplingMap =
                serde_json::from_value(field(value, "coupling_map")?.clone())?;
            coupling_map.rebuild_caches();
            Ok(Arc::new(ConnectivityPredicate::new(coupling_map)))
        });
        registry.register_unit::<MaxTwoQubitGatesPredicate>();
        registry.register_unit::<NoClassicalBitsPredicate>();
        registry.register_unit::<NoClassicalControlPredicate>();
        registry.register_unit::<NoBarriersPredicate>();
        registry.register_unit::<NoMidMeasurePredicate>();
        registry.register_unit::<NoSymbolsPredicate>();
        registry.register_unit::<DefaultRegisterPredicate>();
        registry
    }

    /// Register a constructor.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        constructor: impl Fn(&Value) -> CompileResult<PredicatePtr> + Send + Sync + 'static,
    ) {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    fn register_unit<P: Predicate + Default>(&mut self) {
        let name = P::default().kind().name();
        self.register(name, |_| Ok(Arc::new(P::default())));
    }

    /// Check if a predicate name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Rebuild a predicate from `{"type": <name>, ...}`.
    pub fn from_json(&self, value: &Value) -> CompileResult<PredicatePtr> {
        let name = str_field(value, "type")?;
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| CompileError::config(format!("unknown predicate \"{name}\"")))?;
        constructor(value)
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_library()
    }
}

// ============================================================================
// Passes
// ============================================================================

/// Registry of standard pass constructors and metrics.
pub struct PassRegistry {
    passes: FxHashMap<String, PassConstructor>,
    metrics: FxHashMap<String, Metric>,
    predicates: PredicateRegistry,
}

impl PassRegistry {
    /// Create a registry with no passes or metrics, resolving predicates
    /// through `predicates`.
    pub fn new(predicates: PredicateRegistry) -> Self {
        Self {
            passes: FxHashMap::default(),
            metrics: FxHashMap::default(),
            predicates,
        }
    }

    /// A registry holding the built-in structural passes, the library
    /// predicates and the circuit size metrics.
    pub fn with_library() -> Self {
        let mut registry = Self::new(PredicateRegistry::with_library());
        registry.register_pass("FlattenRegisters", |_| Ok(library::flatten_registers()));
        registry.register_pass("RemoveBarriers", |_| Ok(library::remove_barriers()));
        registry.register_pass("RemoveBlankWires", |_| Ok(library::remove_blank_wires()));
        registry.register_pass("RenameQubitsPass", |body| {
            let map = library::qubit_map_from_json(field(body, "qubit_map")?)?;
            library::rename_qubits(map)
        });
        registry.register_metric("n_ops", Circuit::n_ops);
        registry.register_metric("n_qubits", Circuit::n_qubits);
        registry.register_metric("depth", Circuit::depth);
        registry
    }

    /// Register a standard pass constructor. It receives the
    /// `"StandardPass"` body of the config, name included.
    pub fn register_pass(
        &mut self,
        name: impl Into<String>,
        constructor: impl Fn(&Value) -> CompileResult<StandardPass> + Send + Sync + 'static,
    ) {
        self.passes.insert(name.into(), Arc::new(constructor));
    }

    /// Register a metric for `RepeatWithMetricPass`.
    pub fn register_metric(
        &mut self,
        name: impl Into<String>,
        metric: impl Fn(&Circuit) -> usize + Send + Sync + 'static,
    ) {
        self.metrics.insert(name.into(), Arc::new(metric));
    }

    /// The predicate registry.
    pub fn predicates(&self) -> &PredicateRegistry {
        &self.predicates
    }

    /// Mutable access to the predicate registry.
    pub fn predicates_mut(&mut self) -> &mut PredicateRegistry {
        &mut self.predicates
    }

    /// Rebuild a pass tree from its config.
    pub fn pass_from_json(&self, value: &Value) -> CompileResult<PassPtr> {
        let class = str_field(value, "pass_class")?;
        let body = field(value, class)?;
        debug!(class, "rebuilding pass");
        let pass: PassPtr = match class {
            "StandardPass" => {
                let name = str_field(body, "name")?;
                let constructor = self
                    .passes
                    .get(name)
                    .ok_or_else(|| CompileError::config(format!("unknown pass \"{name}\"")))?;
                Arc::new(constructor(body)?)
            }
            "SequencePass" => {
                let sequence = field(body, "sequence")?
                    .as_array()
                    .ok_or_else(|| CompileError::config("sequence must be an array"))?;
                let passes = sequence
                    .iter()
                    .map(|p| self.pass_from_json(p))
                    .collect::<CompileResult<Vec<_>>>()?;
                let strict = body.get("strict").and_then(Value::as_bool).unwrap_or(true);
                Arc::new(SequencePass::with_strict(passes, strict)?)
            }
            "RepeatPass" => Arc::new(RepeatPass::new(
                self.pass_from_json(field(body, "body")?)?,
            )?),
            "RepeatUntilSatisfiedPass" => {
                let inner = self.pass_from_json(field(body, "body")?)?;
                let predicate = field(body, "predicate")?;
                if predicate.is_null() {
                    return Err(CompileError::config(
                        "RepeatUntilSatisfiedPass has an unserializable predicate",
                    ));
                }
                Arc::new(RepeatUntilSatisfiedPass::new(
                    inner,
                    self.predicates.from_json(predicate)?,
                )?)
            }
            "RepeatWithMetricPass" => {
                let inner = self.pass_from_json(field(body, "body")?)?;
                let name = str_field(body, "metric")?;
                let metric = self
                    .metrics
                    .get(name)
                    .ok_or_else(|| CompileError::config(format!("unknown metric \"{name}\"")))?;
                Arc::new(RepeatWithMetricPass::from_metric(
                    inner,
                    name,
                    Arc::clone(metric),
                )?)
            }
            other => {
                return Err(CompileError::config(format!(
                    "unknown pass class \"{other}\""
                )));
            }
        };
        Ok(pass)
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::with_library()
    }
}

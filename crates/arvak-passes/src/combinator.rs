//! Sequencing and repetition of passes.
//!
//! Each combinator computes its contract with [`match_passes`] when it is
//! built, so an impossible pipeline is rejected before any circuit is
//! touched.

use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use arvak_circuit::Circuit;

use crate::compilation_unit::CompilationUnit;
use crate::contract::{PassConditions, match_passes};
use crate::error::{CompileError, CompileResult};
use crate::pass::{Callbacks, Pass, PassPtr, SafetyMode};
use crate::predicate::PredicatePtr;

/// Contract of `pass` run twice in a row.
fn self_composed(pass: &dyn Pass) -> CompileResult<PassConditions> {
    match_passes(pass.conditions(), pass.conditions(), true)
}

// ============================================================================
// Sequence
// ============================================================================

/// Passes applied one after another.
#[derive(Clone)]
pub struct SequencePass {
    passes: Vec<PassPtr>,
    conditions: PassConditions,
    strict: bool,
}

impl SequencePass {
    /// Sequence `passes`, rejecting any statically provable contradiction.
    pub fn new(passes: Vec<PassPtr>) -> CompileResult<Self> {
        Self::with_strict(passes, true)
    }

    /// Sequence `passes`. A lenient sequence records contradicted
    /// requirements instead of rejecting them.
    pub fn with_strict(passes: Vec<PassPtr>, strict: bool) -> CompileResult<Self> {
        let (first, rest) = passes.split_first().ok_or(CompileError::EmptySequence)?;
        let mut conditions = first.conditions().clone();
        for pass in rest {
            conditions = match_passes(&conditions, pass.conditions(), strict)?;
        }
        Ok(Self {
            passes,
            conditions,
            strict,
        })
    }

    /// The passes in order.
    pub fn passes(&self) -> &[PassPtr] {
        &self.passes
    }

    /// Whether composition was strict.
    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

impl Pass for SequencePass {
    fn name(&self) -> &str {
        "SequencePass"
    }

    fn pass_class(&self) -> &'static str {
        "SequencePass"
    }

    fn conditions(&self) -> &PassConditions {
        &self.conditions
    }

    #[instrument(skip_all, fields(passes = self.passes.len()))]
    fn apply_with(
        &self,
        cu: &mut CompilationUnit,
        mode: SafetyMode,
        callbacks: &Callbacks,
    ) -> CompileResult<bool> {
        callbacks.before(cu, self);
        let mut changed = false;
        for pass in &self.passes {
            changed |= pass.apply_with(cu, mode, callbacks)?;
        }
        callbacks.after(cu, self);
        Ok(changed)
    }

    fn config(&self) -> Value {
        let sequence: Vec<Value> = self.passes.iter().map(|p| p.config()).collect();
        let mut body = json!({ "sequence": sequence });
        if !self.strict {
            body["strict"] = Value::Bool(false);
        }
        json!({ "pass_class": "SequencePass", "SequencePass": body })
    }
}

// ============================================================================
// Repetition
// ============================================================================

/// Applies its body until the body reports no change.
#[derive(Clone)]
pub struct RepeatPass {
    body: PassPtr,
    conditions: PassConditions,
}

impl RepeatPass {
    /// Fails if the body cannot follow itself.
    pub fn new(body: PassPtr) -> CompileResult<Self> {
        let conditions = self_composed(body.as_ref())?;
        Ok(Self { body, conditions })
    }

    pub fn body(&self) -> &PassPtr {
        &self.body
    }
}

impl Pass for RepeatPass {
    fn name(&self) -> &str {
        "RepeatPass"
    }

    fn pass_class(&self) -> &'static str {
        "RepeatPass"
    }

    fn conditions(&self) -> &PassConditions {
        &self.conditions
    }

    #[instrument(skip_all, fields(body = self.body.name()))]
    fn apply_with(
        &self,
        cu: &mut CompilationUnit,
        mode: SafetyMode,
        callbacks: &Callbacks,
    ) -> CompileResult<bool> {
        callbacks.before(cu, self);
        let mut iterations = 0usize;
        while self.body.apply_with(cu, mode, callbacks)? {
            iterations += 1;
            debug!(iterations, "body changed the circuit");
        }
        callbacks.after(cu, self);
        Ok(iterations > 0)
    }

    fn config(&self) -> Value {
        json!({ "pass_class": "RepeatPass", "RepeatPass": { "body": self.body.config() } })
    }
}

/// Applies its body until a predicate holds.
///
/// There is no iteration bound: a body that never establishes the
/// predicate loops forever.
#[derive(Clone)]
pub struct RepeatUntilSatisfiedPass {
    body: PassPtr,
    predicate: PredicatePtr,
    conditions: PassConditions,
}

impl RepeatUntilSatisfiedPass {
    pub fn new(body: PassPtr, predicate: PredicatePtr) -> CompileResult<Self> {
        let conditions = self_composed(body.as_ref())?;
        Ok(Self {
            body,
            predicate,
            conditions,
        })
    }

    pub fn body(&self) -> &PassPtr {
        &self.body
    }

    pub fn predicate(&self) -> &PredicatePtr {
        &self.predicate
    }
}

impl Pass for RepeatUntilSatisfiedPass {
    fn name(&self) -> &str {
        "RepeatUntilSatisfiedPass"
    }

    fn pass_class(&self) -> &'static str {
        "RepeatUntilSatisfiedPass"
    }

    fn conditions(&self) -> &PassConditions {
        &self.conditions
    }

    #[instrument(skip_all, fields(body = self.body.name()))]
    fn apply_with(
        &self,
        cu: &mut CompilationUnit,
        mode: SafetyMode,
        callbacks: &Callbacks,
    ) -> CompileResult<bool> {
        callbacks.before(cu, self);
        let mut iterations = 0usize;
        while !cu.calc_predicate(self.predicate.as_ref()) {
            self.body.apply_with(cu, mode, callbacks)?;
            iterations += 1;
            debug!(iterations, predicate = %self.predicate.description(), "not yet satisfied");
        }
        callbacks.after(cu, self);
        Ok(iterations > 0)
    }

    fn config(&self) -> Value {
        // Unserializable predicates are recorded as null and rejected on load.
        let predicate = self.predicate.to_json().unwrap_or(Value::Null);
        json!({
            "pass_class": "RepeatUntilSatisfiedPass",
            "RepeatUntilSatisfiedPass": { "body": self.body.config(), "predicate": predicate },
        })
    }
}

/// Integer cost of a circuit; lower is better.
pub type Metric = Arc<dyn Fn(&Circuit) -> usize + Send + Sync>;

/// Applies its body while a metric strictly decreases, keeping the best
/// unit seen.
#[derive(Clone)]
pub struct RepeatWithMetricPass {
    body: PassPtr,
    metric: Metric,
    metric_name: String,
    conditions: PassConditions,
}

impl RepeatWithMetricPass {
    /// `metric_name` is recorded in the config so the pass can be rebuilt
    /// from a registry.
    pub fn new(
        body: PassPtr,
        metric_name: impl Into<String>,
        metric: impl Fn(&Circuit) -> usize + Send + Sync + 'static,
    ) -> CompileResult<Self> {
        Self::from_metric(body, metric_name, Arc::new(metric))
    }

    pub(crate) fn from_metric(
        body: PassPtr,
        metric_name: impl Into<String>,
        metric: Metric,
    ) -> CompileResult<Self> {
        let conditions = self_composed(body.as_ref())?;
        Ok(Self {
            body,
            metric,
            metric_name: metric_name.into(),
            conditions,
        })
    }

    pub fn body(&self) -> &PassPtr {
        &self.body
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }
}

impl Pass for RepeatWithMetricPass {
    fn name(&self) -> &str {
        "RepeatWithMetricPass"
    }

    fn pass_class(&self) -> &'static str {
        "RepeatWithMetricPass"
    }

    fn conditions(&self) -> &PassConditions {
        &self.conditions
    }

    #[instrument(skip_all, fields(body = self.body.name(), metric = %self.metric_name))]
    fn apply_with(
        &self,
        cu: &mut CompilationUnit,
        mode: SafetyMode,
        callbacks: &Callbacks,
    ) -> CompileResult<bool> {
        callbacks.before(cu, self);
        let mut best_value = (self.metric)(cu.circuit());
        let mut best: Option<CompilationUnit> = None;
        let mut candidate = cu.clone();
        loop {
            self.body.apply_with(&mut candidate, mode, callbacks)?;
            let value = (self.metric)(candidate.circuit());
            if value >= best_value {
                break;
            }
            debug!(from = best_value, to = value, "metric improved");
            best_value = value;
            best = Some(candidate.clone());
        }
        let improved = best.is_some();
        if let Some(best) = best {
            *cu = best;
        }
        callbacks.after(cu, self);
        Ok(improved)
    }

    fn config(&self) -> Value {
        json!({
            "pass_class": "RepeatWithMetricPass",
            "RepeatWithMetricPass": { "body": self.body.config(), "metric": self.metric_name },
        })
    }
}

macro_rules! opaque_debug {
    ($($ty:ty),*) => {$(
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("conditions", &self.conditions)
                    .finish_non_exhaustive()
            }
        }
    )*};
}

opaque_debug!(
    SequencePass,
    RepeatPass,
    RepeatUntilSatisfiedPass,
    RepeatWithMetricPass
);

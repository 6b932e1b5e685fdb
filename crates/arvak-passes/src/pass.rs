//! Pass trait and the standard pass.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use arvak_circuit::Circuit;

use crate::compilation_unit::CompilationUnit;
use crate::contract::{Guarantee, PassConditions, PostConditions};
use crate::error::{CompileError, CompileResult};
use crate::predicate::{PredicateKind, PredicateMap, PredicatePtr};
use crate::unit_maps::UnitMaps;

/// How much verification a pass performs at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SafetyMode {
    /// Re-verify every precondition and every specific postcondition.
    Audit,
    /// Check preconditions, trusting the cache where it proves them.
    #[default]
    Default,
    /// Skip runtime checks. The cache is still maintained.
    Off,
}

/// Hook invoked with the unit and the config of the pass being applied.
pub type PassCallback = Arc<dyn Fn(&CompilationUnit, &Value) + Send + Sync>;

/// Optional hooks run before and after each pass application.
///
/// Combinators call them for themselves and forward them to their bodies.
#[derive(Clone, Default)]
pub struct Callbacks {
    before: Option<PassCallback>,
    after: Option<PassCallback>,
}

impl Callbacks {
    /// No hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` before each pass.
    #[must_use]
    pub fn with_before(
        mut self,
        f: impl Fn(&CompilationUnit, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.before = Some(Arc::new(f));
        self
    }

    /// Run `f` after each pass.
    #[must_use]
    pub fn with_after(
        mut self,
        f: impl Fn(&CompilationUnit, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.after = Some(Arc::new(f));
        self
    }

    pub(crate) fn before(&self, cu: &CompilationUnit, pass: &dyn Pass) {
        if let Some(f) = &self.before {
            f(cu, &pass.config());
        }
    }

    pub(crate) fn after(&self, cu: &CompilationUnit, pass: &dyn Pass) {
        if let Some(f) = &self.after {
            f(cu, &pass.config());
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// A contract-annotated transformation of a compilation unit.
pub trait Pass: Send + Sync {
    /// Name of the pass.
    fn name(&self) -> &str;

    /// Class tag used in configs and display, e.g. `"StandardPass"`.
    fn pass_class(&self) -> &'static str;

    /// Preconditions and postconditions.
    fn conditions(&self) -> &PassConditions;

    /// Predicates required before the pass runs.
    fn preconditions(&self) -> &PredicateMap {
        &self.conditions().preconditions
    }

    /// What holds after the pass runs.
    fn postconditions(&self) -> &PostConditions {
        &self.conditions().postconditions
    }

    /// Apply the pass. Returns whether the circuit changed.
    fn apply_with(
        &self,
        cu: &mut CompilationUnit,
        mode: SafetyMode,
        callbacks: &Callbacks,
    ) -> CompileResult<bool>;

    /// Apply the pass with default safety and no callbacks.
    fn apply(&self, cu: &mut CompilationUnit) -> CompileResult<bool> {
        self.apply_with(cu, SafetyMode::Default, &Callbacks::default())
    }

    /// Serialized form: `{"pass_class": <class>, <class>: {...}}`.
    fn config(&self) -> Value;
}

/// Shared handle to a pass.
pub type PassPtr = Arc<dyn Pass>;

impl fmt::Display for dyn Pass + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "***PassType: {}***", self.pass_class())?;
        write!(f, "{}", self.conditions())
    }
}

impl fmt::Debug for dyn Pass + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pass")
            .field("name", &self.name())
            .field("pass_class", &self.pass_class())
            .finish()
    }
}

/// First precondition that does not hold, consulting the cache.
///
/// A presumed-true cached predicate that implies the requirement skips
/// verification. A requirement verified live and absent from the cache is
/// recorded as true.
fn unsatisfied_precondition(
    conditions: &PassConditions,
    cu: &mut CompilationUnit,
    mode: SafetyMode,
) -> Option<PredicatePtr> {
    for (kind, required) in &conditions.preconditions {
        let trusted = match cu.cached(*kind) {
            Some((cached, true)) => matches!(cached.implies(required.as_ref()), Ok(true)),
            _ => false,
        };
        if trusted {
            continue;
        }
        if !cu.calc_predicate(required.as_ref()) {
            return Some(required.clone());
        }
        if cu.cached(*kind).is_none() {
            cu.cache_mut().insert(*kind, (required.clone(), true));
        }
    }
    if mode == SafetyMode::Audit {
        for required in conditions.preconditions.values() {
            if !cu.calc_predicate(required.as_ref()) {
                return Some(required.clone());
            }
        }
    }
    None
}

/// Bring the cache up to date after a transform ran.
///
/// Each cached kind follows its resolved guarantee: the generic entry if the
/// pass declares one, else the default.
fn update_cache(
    postconditions: &PostConditions,
    cu: &mut CompilationUnit,
    mode: SafetyMode,
) -> CompileResult<()> {
    let cleared: Vec<PredicateKind> = cu
        .cache_mut()
        .keys()
        .copied()
        .filter(|kind| postconditions.guarantee(*kind) == Guarantee::Clear)
        .collect();
    for kind in cleared {
        let explicit = postconditions.generic.contains_key(&kind);
        if mode == SafetyMode::Audit && explicit {
            if let Some((cached, _)) = cu.cached(kind) {
                if cu.calc_predicate(cached.as_ref()) {
                    warn!(
                        predicate = %cached.description(),
                        "predicate cleared by pass still holds"
                    );
                }
            }
        }
        if let Some(entry) = cu.cache_mut().get_mut(&kind) {
            entry.1 = false;
        }
    }
    for (kind, provided) in &postconditions.specific {
        if mode == SafetyMode::Audit && !cu.calc_predicate(provided.as_ref()) {
            return Err(CompileError::UnsatisfiedPredicate(provided.description()));
        }
        cu.cache_mut().insert(*kind, (provided.clone(), true));
    }
    Ok(())
}

/// Transform run by a [`StandardPass`]: rewrites the circuit, updates the
/// rename context, and reports whether anything changed.
pub type Transform =
    Arc<dyn Fn(&mut Circuit, &mut UnitMaps) -> CompileResult<bool> + Send + Sync>;

/// A single transform wrapped in a contract.
#[derive(Clone)]
pub struct StandardPass {
    name: String,
    conditions: PassConditions,
    transform: Transform,
    params: Map<String, Value>,
}

impl StandardPass {
    /// A pass with no preconditions that clears every predicate.
    pub fn new(
        name: impl Into<String>,
        transform: impl Fn(&mut Circuit, &mut UnitMaps) -> CompileResult<bool>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            conditions: PassConditions::default(),
            transform: Arc::new(transform),
            params: Map::new(),
        }
    }

    /// Require a predicate before running.
    #[must_use]
    pub fn with_precondition(mut self, predicate: PredicatePtr) -> Self {
        self.conditions
            .preconditions
            .insert(predicate.kind(), predicate);
        self
    }

    /// Declare what holds after running.
    #[must_use]
    pub fn with_postconditions(mut self, postconditions: PostConditions) -> Self {
        self.conditions.postconditions = postconditions;
        self
    }

    /// Record a literal parameter in the pass config.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

impl fmt::Debug for StandardPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardPass")
            .field("name", &self.name)
            .field("conditions", &self.conditions)
            .finish_non_exhaustive()
    }
}

impl Pass for StandardPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn pass_class(&self) -> &'static str {
        "StandardPass"
    }

    fn conditions(&self) -> &PassConditions {
        &self.conditions
    }

    #[instrument(skip_all, fields(pass = %self.name))]
    fn apply_with(
        &self,
        cu: &mut CompilationUnit,
        mode: SafetyMode,
        callbacks: &Callbacks,
    ) -> CompileResult<bool> {
        callbacks.before(cu, self);
        if mode != SafetyMode::Off {
            if let Some(failed) = unsatisfied_precondition(&self.conditions, cu, mode) {
                return Err(CompileError::UnsatisfiedPredicate(failed.description()));
            }
        }
        let (circuit, maps) = cu.parts_mut();
        let changed = (self.transform)(circuit, maps)?;
        update_cache(&self.conditions.postconditions, cu, mode)?;
        debug!(changed, ops = cu.circuit().n_ops(), "pass applied");
        callbacks.after(cu, self);
        Ok(changed)
    }

    fn config(&self) -> Value {
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(self.name.clone()));
        body.extend(self.params.clone());
        json!({ "pass_class": "StandardPass", "StandardPass": body })
    }
}

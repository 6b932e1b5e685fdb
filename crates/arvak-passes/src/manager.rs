//! Pass manager for orchestrating compilation.

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::combinator::SequencePass;
use crate::compilation_unit::CompilationUnit;
use crate::contract::PassConditions;
use crate::error::CompileResult;
use crate::pass::{Callbacks, Pass, PassPtr, SafetyMode};

/// Runs a composed pipeline of passes over compilation units.
///
/// The pipeline is composed once, when the manager is built, so an
/// incompatible pipeline never touches a circuit.
#[derive(Debug, Default)]
pub struct PassManager {
    /// The composed pipeline, absent when no passes were added.
    pipeline: Option<SequencePass>,
    safety_mode: SafetyMode,
    callbacks: Callbacks,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the pipeline on a compilation unit. Returns whether any pass
    /// changed the circuit.
    #[instrument(skip(self, cu), fields(mode = ?self.safety_mode))]
    pub fn run(&self, cu: &mut CompilationUnit) -> CompileResult<bool> {
        let Some(pipeline) = &self.pipeline else {
            info!("Pass manager has no passes");
            return Ok(false);
        };
        info!(
            "Running pass manager with {} passes on circuit with {} qubits",
            pipeline.passes().len(),
            cu.circuit().n_qubits()
        );

        let changed = pipeline.apply_with(cu, self.safety_mode, &self.callbacks)?;

        info!(
            changed,
            targets_satisfied = cu.check_all_predicates(),
            "Pass manager completed, ops: {}",
            cu.circuit().n_ops()
        );
        Ok(changed)
    }

    /// The composed contract of the pipeline.
    pub fn conditions(&self) -> Option<&PassConditions> {
        self.pipeline.as_ref().map(Pass::conditions)
    }

    /// Config of the composed pipeline.
    pub fn config(&self) -> Option<Value> {
        self.pipeline.as_ref().map(Pass::config)
    }

    /// Get the safety mode used by [`run`](Self::run).
    pub fn safety_mode(&self) -> SafetyMode {
        self.safety_mode
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.pipeline.as_ref().map_or(0, |p| p.passes().len())
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.pipeline.is_none()
    }
}

/// Builder for pass managers.
pub struct PassManagerBuilder {
    passes: Vec<PassPtr>,
    safety_mode: SafetyMode,
    strict: bool,
    callbacks: Callbacks,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings: no passes, default
    /// safety and strict composition.
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            safety_mode: SafetyMode::Default,
            strict: true,
            callbacks: Callbacks::new(),
        }
    }

    /// Append a pass to the pipeline.
    #[must_use]
    pub fn with_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Arc::new(pass));
        self
    }

    /// Append shared passes to the pipeline.
    #[must_use]
    pub fn with_passes(mut self, passes: impl IntoIterator<Item = PassPtr>) -> Self {
        self.passes.extend(passes);
        self
    }

    /// Set the safety mode.
    #[must_use]
    pub fn with_safety_mode(mut self, mode: SafetyMode) -> Self {
        self.safety_mode = mode;
        self
    }

    /// Choose strict or lenient composition.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the before/after hooks.
    #[must_use]
    pub fn with_callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Compose the pipeline.
    ///
    /// Fails with [`CompileError::IncompatiblePasses`](crate::CompileError::IncompatiblePasses)
    /// if strict composition finds a contradiction.
    pub fn build(self) -> CompileResult<PassManager> {
        let pipeline = if self.passes.is_empty() {
            None
        } else {
            Some(SequencePass::with_strict(self.passes, self.strict)?)
        };
        Ok(PassManager {
            pipeline,
            safety_mode: self.safety_mode,
            callbacks: self.callbacks,
        })
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Library of common predicates.

use serde_json::{Value, json};
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use arvak_circuit::builtin::{as_conditional, is_barrier, is_measure};
use arvak_circuit::unit::NODE_REGISTER;
use arvak_circuit::{Circuit, Command, OpRef, Operation, UnitId};

use crate::coupling::CouplingMap;
use crate::error::{CompileError, CompileResult};
use crate::predicate::{
    Predicate, PredicateKind, PredicatePtr, same_kind, trivial_implies, trivial_meet,
};

/// The operation a command ultimately applies, with any conditions peeled off.
fn innermost(op: &OpRef) -> OpRef {
    match as_conditional(op.as_ref()) {
        Some(cond) => cond.unwind().1,
        None => op.clone(),
    }
}

fn qubit_count(cmd: &Command) -> usize {
    cmd.args.iter().filter(|u| u.is_qubit()).count()
}

// ============================================================================
// Parameterised predicates
// ============================================================================

/// Every operation (conditions unwrapped, barriers ignored) has an allowed
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GateSetPredicate {
    allowed: BTreeSet<String>,
}

impl GateSetPredicate {
    pub const KIND: PredicateKind = PredicateKind::new("GateSetPredicate");

    /// Allow exactly the given operation names.
    pub fn new<S: Into<String>>(allowed: impl IntoIterator<Item = S>) -> Self {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// The allowed operation names.
    pub fn allowed(&self) -> &BTreeSet<String> {
        &self.allowed
    }
}

impl Predicate for GateSetPredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        circuit.commands().all(|cmd| {
            let op = innermost(&cmd.op);
            is_barrier(op.as_ref()) || self.allowed.contains(op.name())
        })
    }

    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool> {
        let other = same_kind::<Self>(other)?;
        Ok(self.allowed.is_subset(&other.allowed))
    }

    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        let other = same_kind::<Self>(other)?;
        Ok(Arc::new(Self {
            allowed: self.allowed.intersection(&other.allowed).cloned().collect(),
        }))
    }

    fn description(&self) -> String {
        let mut s = format!("{}:{{ ", Self::KIND);
        for name in &self.allowed {
            s.push_str(name);
            s.push(' ');
        }
        s.push('}');
        s
    }

    fn to_json(&self) -> CompileResult<Value> {
        Ok(json!({ "type": Self::KIND.name(), "allowed_types": self.allowed }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The circuit has at most `n` qubits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxNQubitsPredicate(pub usize);

impl MaxNQubitsPredicate {
    pub const KIND: PredicateKind = PredicateKind::new("MaxNQubitsPredicate");
}

impl Predicate for MaxNQubitsPredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        circuit.n_qubits() <= self.0
    }

    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool> {
        Ok(self.0 <= same_kind::<Self>(other)?.0)
    }

    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        Ok(Arc::new(Self(self.0.min(same_kind::<Self>(other)?.0))))
    }

    fn description(&self) -> String {
        format!("{}({})", Self::KIND, self.0)
    }

    fn to_json(&self) -> CompileResult<Value> {
        Ok(json!({ "type": Self::KIND.name(), "n_qubits": self.0 }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Every multi-qubit operation acts on adjacent device nodes, and every qubit
/// is a `node[i]` of the device.
#[derive(Debug, Clone)]
pub struct ConnectivityPredicate {
    coupling_map: CouplingMap,
}

impl ConnectivityPredicate {
    pub const KIND: PredicateKind = PredicateKind::new("ConnectivityPredicate");

    pub fn new(coupling_map: CouplingMap) -> Self {
        Self { coupling_map }
    }

    pub fn coupling_map(&self) -> &CouplingMap {
        &self.coupling_map
    }

    fn node_index(&self, unit: &UnitId) -> Option<u32> {
        match unit.index.as_slice() {
            [i] if unit.is_qubit() && unit.register == NODE_REGISTER => {
                self.coupling_map.contains_node(*i).then_some(*i)
            }
            _ => None,
        }
    }
}

impl Predicate for ConnectivityPredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        if circuit.qubits().iter().any(|q| self.node_index(q).is_none()) {
            return false;
        }
        circuit.commands().all(|cmd| {
            if is_barrier(innermost(&cmd.op).as_ref()) {
                return true;
            }
            let nodes: Vec<u32> = cmd
                .args
                .iter()
                .filter(|u| u.is_qubit())
                .filter_map(|u| self.node_index(u))
                .collect();
            match nodes.as_slice() {
                [a, b] => self.coupling_map.is_connected(*a, *b),
                other => other.len() < 2,
            }
        })
    }

    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool> {
        let other = same_kind::<Self>(other)?;
        Ok(self.coupling_map.is_subgraph_of(&other.coupling_map))
    }

    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        let other = same_kind::<Self>(other)?;
        Ok(Arc::new(Self::new(
            self.coupling_map.intersection(&other.coupling_map),
        )))
    }

    fn description(&self) -> String {
        format!(
            "{}:{{ Nodes: {}, Edges: {} }}",
            Self::KIND,
            self.coupling_map.num_qubits(),
            self.coupling_map.edges().len()
        )
    }

    fn to_json(&self) -> CompileResult<Value> {
        Ok(json!({
            "type": Self::KIND.name(),
            "coupling_map": serde_json::to_value(&self.coupling_map)?,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Closure signature for [`UserDefinedPredicate`].
pub type VerifyFn = Arc<dyn Fn(&Circuit) -> bool + Send + Sync>;

/// A predicate backed by an arbitrary closure.
///
/// It has no algebra: `implies` and `meet` always fail, and it cannot be
/// serialized.
#[derive(Clone)]
pub struct UserDefinedPredicate {
    func: VerifyFn,
}

impl UserDefinedPredicate {
    pub const KIND: PredicateKind = PredicateKind::new("UserDefinedPredicate");

    pub fn new(func: impl Fn(&Circuit) -> bool + Send + Sync + 'static) -> Self {
        Self {
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for UserDefinedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserDefinedPredicate")
    }
}

impl Predicate for UserDefinedPredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        (self.func)(circuit)
    }

    fn implies(&self, _other: &dyn Predicate) -> CompileResult<bool> {
        Err(CompileError::IncorrectPredicate(
            "Cannot verify implication of user defined predicates".to_string(),
        ))
    }

    fn meet(&self, _other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        Err(CompileError::IncorrectPredicate(
            "Cannot find the meet of user defined predicates".to_string(),
        ))
    }

    fn to_json(&self) -> CompileResult<Value> {
        Err(CompileError::config(
            "UserDefinedPredicate cannot be serialized",
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Parameterless predicates
// ============================================================================

/// No operation acts on more than two qubits. Barriers are exempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxTwoQubitGatesPredicate;

impl MaxTwoQubitGatesPredicate {
    pub const KIND: PredicateKind = PredicateKind::new("MaxTwoQubitGatesPredicate");
}

impl Predicate for MaxTwoQubitGatesPredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }
    fn verify(&self, circuit: &Circuit) -> bool {
        circuit
            .commands()
            .all(|cmd| is_barrier(innermost(&cmd.op).as_ref()) || qubit_count(&cmd) <= 2)
    }
    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool> {
        trivial_implies::<Self>(other)
    }
    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        trivial_meet::<Self>(other)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The circuit has no classical bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClassicalBitsPredicate;

impl NoClassicalBitsPredicate {
    pub const KIND: PredicateKind = PredicateKind::new("NoClassicalBitsPredicate");
}

impl Predicate for NoClassicalBitsPredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }
    fn verify(&self, circuit: &Circuit) -> bool {
        circuit.n_bits() == 0
    }
    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool> {
        trivial_implies::<Self>(other)
    }
    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        trivial_meet::<Self>(other)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// No operation is classically conditioned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClassicalControlPredicate;

impl NoClassicalControlPredicate {
    pub const KIND: PredicateKind = PredicateKind::new("NoClassicalControlPredicate");
}

impl Predicate for NoClassicalControlPredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }
    fn verify(&self, circuit: &Circuit) -> bool {
        circuit
            .commands()
            .all(|cmd| as_conditional(cmd.op.as_ref()).is_none())
    }
    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool> {
        trivial_implies::<Self>(other)
    }
    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        trivial_meet::<Self>(other)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The circuit contains no barrier.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBarriersPredicate;

impl NoBarriersPredicate {
    pub const KIND: PredicateKind = PredicateKind::new("NoBarriersPredicate");
}

impl Predicate for NoBarriersPredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }
    fn verify(&self, circuit: &Circuit) -> bool {
        circuit
            .commands()
            .all(|cmd| !is_barrier(innermost(&cmd.op).as_ref()))
    }
    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool> {
        trivial_implies::<Self>(other)
    }
    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        trivial_meet::<Self>(other)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// No unit is touched again after it takes part in a measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMidMeasurePredicate;

impl NoMidMeasurePredicate {
    pub const KIND: PredicateKind = PredicateKind::new("NoMidMeasurePredicate");

    /// Record `op` on `args`, returning false if it touches a measured unit.
    fn visit(op: &dyn Operation, args: &[UnitId], measured: &mut BTreeSet<UnitId>) -> bool {
        if let Some(cond) = as_conditional(op) {
            let (bits, rest) = args.split_at(cond.width().min(args.len()));
            if bits.iter().any(|b| measured.contains(b)) {
                return false;
            }
            return Self::visit(cond.op().as_ref(), rest, measured);
        }
        if is_measure(op) {
            let fresh_qubit = args.first().is_some_and(|q| measured.insert(q.clone()));
            let fresh_bit = args.get(1).is_some_and(|c| measured.insert(c.clone()));
            return fresh_qubit && fresh_bit;
        }
        args.iter().all(|a| !measured.contains(a))
    }
}

impl Predicate for NoMidMeasurePredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }
    fn verify(&self, circuit: &Circuit) -> bool {
        if circuit.n_bits() == 0 {
            return true;
        }
        let mut measured = BTreeSet::new();
        circuit
            .commands()
            .all(|cmd| Self::visit(cmd.op.as_ref(), &cmd.args, &mut measured))
    }
    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool> {
        trivial_implies::<Self>(other)
    }
    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        trivial_meet::<Self>(other)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The circuit has no free symbols.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbolsPredicate;

impl NoSymbolsPredicate {
    pub const KIND: PredicateKind = PredicateKind::new("NoSymbolsPredicate");
}

impl Predicate for NoSymbolsPredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }
    fn verify(&self, circuit: &Circuit) -> bool {
        !circuit.is_symbolic()
    }
    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool> {
        trivial_implies::<Self>(other)
    }
    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        trivial_meet::<Self>(other)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Every unit lives in its kind's default register.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRegisterPredicate;

impl DefaultRegisterPredicate {
    pub const KIND: PredicateKind = PredicateKind::new("DefaultRegisterPredicate");
}

impl Predicate for DefaultRegisterPredicate {
    fn kind(&self) -> PredicateKind {
        Self::KIND
    }
    fn verify(&self, circuit: &Circuit) -> bool {
        circuit.is_simple()
    }
    fn implies(&self, other: &dyn Predicate) -> CompileResult<bool> {
        trivial_implies::<Self>(other)
    }
    fn meet(&self, other: &dyn Predicate) -> CompileResult<PredicatePtr> {
        trivial_meet::<Self>(other)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

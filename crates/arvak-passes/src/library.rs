//! Built-in structural passes.
//!
//! These passes only touch unit names and boundary wiring. Each keeps the
//! unit maps of the compilation unit in step with the circuit.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use arvak_circuit::UnitId;
use arvak_circuit::builtin::is_barrier;

use crate::contract::{Guarantee, PostConditions};
use crate::error::CompileResult;
use crate::pass::StandardPass;
use crate::predicates::{ConnectivityPredicate, DefaultRegisterPredicate, NoBarriersPredicate};

/// Move every unit into its default register.
pub fn flatten_registers() -> StandardPass {
    StandardPass::new("FlattenRegisters", |circuit, maps| {
        if circuit.is_simple() {
            return Ok(false);
        }
        let renaming = circuit.flatten_registers()?;
        maps.update(&renaming, &renaming);
        Ok(true)
    })
    .with_postconditions(
        PostConditions::preserve_all()
            .with_specific(Arc::new(DefaultRegisterPredicate))
            .with_generic(ConnectivityPredicate::KIND, Guarantee::Clear),
    )
}

/// Delete every barrier.
pub fn remove_barriers() -> StandardPass {
    StandardPass::new("RemoveBarriers", |circuit, _| {
        let barriers: Vec<_> = circuit
            .commands()
            .filter(|cmd| is_barrier(cmd.op.as_ref()))
            .map(|cmd| cmd.vertex)
            .collect();
        for &v in &barriers {
            circuit.remove_op(v)?;
        }
        Ok(!barriers.is_empty())
    })
    .with_postconditions(
        PostConditions::preserve_all().with_specific(Arc::new(NoBarriersPredicate)),
    )
}

/// Rename qubits according to `qubit_map`.
///
/// Qubits absent from the circuit are ignored. The map is recorded in the
/// pass config as a list of `[from, to]` pairs.
pub fn rename_qubits(qubit_map: BTreeMap<UnitId, UnitId>) -> CompileResult<StandardPass> {
    let pairs: Vec<(&UnitId, &UnitId)> = qubit_map.iter().collect();
    let param = serde_json::to_value(pairs)?;
    let pass = StandardPass::new("RenameQubitsPass", move |circuit, maps| {
        let changed = circuit.rename_units(&qubit_map)?;
        maps.update(&qubit_map, &qubit_map);
        Ok(changed)
    })
    .with_postconditions(
        PostConditions::preserve_all()
            .with_generic(DefaultRegisterPredicate::KIND, Guarantee::Clear)
            .with_generic(ConnectivityPredicate::KIND, Guarantee::Clear),
    )
    .with_param("qubit_map", param);
    Ok(pass)
}

/// Drop units whose wire carries no operation.
pub fn remove_blank_wires() -> StandardPass {
    StandardPass::new("RemoveBlankWires", |circuit, maps| {
        let removed = circuit.remove_blank_wires()?;
        for unit in &removed {
            if !maps.remove_unit(unit) {
                debug!(%unit, "removed unit was not tracked by the unit maps");
            }
        }
        Ok(!removed.is_empty())
    })
    .with_postconditions(
        PostConditions::preserve_all()
            .with_generic(DefaultRegisterPredicate::KIND, Guarantee::Clear),
    )
}

/// Parse the `qubit_map` parameter written by [`rename_qubits`].
pub(crate) fn qubit_map_from_json(value: &Value) -> CompileResult<BTreeMap<UnitId, UnitId>> {
    let pairs: Vec<(UnitId, UnitId)> = serde_json::from_value(value.clone())?;
    Ok(pairs.into_iter().collect())
}

//! Unit identifiers: named logical wires.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::op::WireKind;

/// Default register for qubits.
pub const DEFAULT_QUBIT_REGISTER: &str = "q";
/// Default register for classical bits.
pub const DEFAULT_BIT_REGISTER: &str = "c";
/// Default register for WASM state channels.
pub const DEFAULT_WASM_REGISTER: &str = "_w";
/// Default register for RNG state channels.
pub const DEFAULT_RNG_REGISTER: &str = "_r";
/// Register used for physical device qubits.
pub const NODE_REGISTER: &str = "node";

/// The kind of logical wire a unit identifies.
///
/// The declaration order defines the canonical unit order: qubits sort
/// before bits, bits before resource channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// A quantum bit.
    Qubit,
    /// A classical bit.
    Bit,
    /// Auxiliary WASM state channel.
    WasmState,
    /// Auxiliary RNG state channel.
    RngState,
}

impl UnitKind {
    /// The wire kind carried by linear edges of this unit.
    pub fn wire_kind(self) -> WireKind {
        match self {
            UnitKind::Qubit => WireKind::Quantum,
            UnitKind::Bit => WireKind::Classical,
            UnitKind::WasmState => WireKind::Wasm,
            UnitKind::RngState => WireKind::Rng,
        }
    }

    /// The default register name for this kind.
    pub fn default_register(self) -> &'static str {
        match self {
            UnitKind::Qubit => DEFAULT_QUBIT_REGISTER,
            UnitKind::Bit => DEFAULT_BIT_REGISTER,
            UnitKind::WasmState => DEFAULT_WASM_REGISTER,
            UnitKind::RngState => DEFAULT_RNG_REGISTER,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitKind::Qubit => "qubit",
            UnitKind::Bit => "bit",
            UnitKind::WasmState => "wasm",
            UnitKind::RngState => "rng",
        };
        f.write_str(name)
    }
}

/// Identifier of one logical wire: a register name plus an index tuple.
///
/// Ordering is `(kind, register, index)`, which is the canonical unit order
/// used for boundaries, holes and commands.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId {
    /// What kind of wire this is.
    pub kind: UnitKind,
    /// Register name.
    pub register: String,
    /// Index within the register.
    pub index: Vec<u32>,
}

impl UnitId {
    /// Create a unit in a named register.
    pub fn new(kind: UnitKind, register: impl Into<String>, index: impl Into<Vec<u32>>) -> Self {
        Self {
            kind,
            register: register.into(),
            index: index.into(),
        }
    }

    /// Qubit `n` of the default register.
    pub fn qubit(n: u32) -> Self {
        Self::new(UnitKind::Qubit, DEFAULT_QUBIT_REGISTER, [n])
    }

    /// Bit `n` of the default register.
    pub fn bit(n: u32) -> Self {
        Self::new(UnitKind::Bit, DEFAULT_BIT_REGISTER, [n])
    }

    /// Physical device qubit `n`.
    pub fn node(n: u32) -> Self {
        Self::new(UnitKind::Qubit, NODE_REGISTER, [n])
    }

    /// WASM state channel `n` of the default register.
    pub fn wasm(n: u32) -> Self {
        Self::new(UnitKind::WasmState, DEFAULT_WASM_REGISTER, [n])
    }

    /// RNG state channel `n` of the default register.
    pub fn rng(n: u32) -> Self {
        Self::new(UnitKind::RngState, DEFAULT_RNG_REGISTER, [n])
    }

    /// Whether this is a qubit.
    #[inline]
    pub fn is_qubit(&self) -> bool {
        self.kind == UnitKind::Qubit
    }

    /// Whether this is a classical bit.
    #[inline]
    pub fn is_bit(&self) -> bool {
        self.kind == UnitKind::Bit
    }

    /// Whether the unit lives in its kind's default register with a
    /// one-dimensional index.
    pub fn in_default_register(&self) -> bool {
        self.register == self.kind.default_register() && self.index.len() == 1
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.register)?;
        if self.index.is_empty() {
            return Ok(());
        }
        write!(f, "[")?;
        for (i, idx) in self.index.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{idx}")?;
        }
        write!(f, "]")
    }
}

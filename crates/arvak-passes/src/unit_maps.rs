//! Unit correspondence tracking across passes.
//!
//! A [`UnitBimap`] relates each unit present when compilation began (left)
//! to the unit that currently stands for it (right). [`UnitMaps`] holds the
//! *initial* and *final* maps and is the rename context handed to every
//! transform, so a placement pass can report "q[0] now lives on node[3]"
//! without the caller inspecting the circuit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use arvak_circuit::{Circuit, UnitId};

use crate::error::{CompileError, CompileResult};

/// A bijection between units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitBimap {
    left_to_right: BTreeMap<UnitId, UnitId>,
    right_to_left: BTreeMap<UnitId, UnitId>,
}

impl UnitBimap {
    /// Create a new empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map every unit to itself.
    pub fn identity<'a>(units: impl IntoIterator<Item = &'a UnitId>) -> Self {
        let mut map = Self::new();
        for unit in units {
            map.insert(unit.clone(), unit.clone());
        }
        map
    }

    /// Add a correspondence.
    ///
    /// Any existing pair using either side is removed first so both
    /// directions stay consistent.
    pub fn insert(&mut self, left: UnitId, right: UnitId) {
        if let Some(old_left) = self.right_to_left.remove(&right) {
            self.left_to_right.remove(&old_left);
        }
        if let Some(old_right) = self.left_to_right.remove(&left) {
            self.right_to_left.remove(&old_right);
        }
        self.left_to_right.insert(left.clone(), right.clone());
        self.right_to_left.insert(right, left);
    }

    /// The current unit standing for `left`.
    pub fn get_right(&self, left: &UnitId) -> Option<&UnitId> {
        self.left_to_right.get(left)
    }

    /// The original unit that `right` stands for.
    pub fn get_left(&self, right: &UnitId) -> Option<&UnitId> {
        self.right_to_left.get(right)
    }

    /// Drop the pair whose right side is `right`.
    pub fn remove_right(&mut self, right: &UnitId) -> Option<UnitId> {
        let left = self.right_to_left.remove(right)?;
        self.left_to_right.remove(&left);
        Some(left)
    }

    /// Apply a simultaneous renaming of right-hand units.
    ///
    /// For each `(old, new)`, the pair whose right side is `old` gets right
    /// side `new`. Entries of `renaming` that match no right side are
    /// ignored. Returns whether the map changed.
    pub fn rename_right(&mut self, renaming: &BTreeMap<UnitId, UnitId>) -> bool {
        let mut moved = Vec::new();
        let mut changed = false;
        for (old, new) in renaming {
            if let Some(left) = self.right_to_left.remove(old) {
                self.left_to_right.remove(&left);
                changed |= old != new;
                moved.push((left, new.clone()));
            }
        }
        for (left, right) in moved {
            self.insert(left, right);
        }
        changed
    }

    /// Get the number of pairs.
    pub fn len(&self) -> usize {
        self.left_to_right.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.left_to_right.is_empty()
    }

    /// Iterate over (left, right) pairs in left order.
    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &UnitId)> + '_ {
        self.left_to_right.iter()
    }
}

impl fmt::Display for UnitBimap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (l, r)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{l} -> {r}")?;
        }
        write!(f, "}}")
    }
}

/// The initial and final unit correspondences of a compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMaps {
    /// Original unit to its initial placement.
    pub initial_map: UnitBimap,
    /// Original unit to the unit now carrying its final state.
    pub final_map: UnitBimap,
}

impl UnitMaps {
    /// Identity maps over the units of `circuit`.
    pub fn identity(circuit: &Circuit) -> Self {
        let map = UnitBimap::identity(circuit.units());
        Self {
            initial_map: map.clone(),
            final_map: map,
        }
    }

    /// Apply renamings to both maps. Returns whether anything changed.
    pub fn update(
        &mut self,
        initial: &BTreeMap<UnitId, UnitId>,
        final_: &BTreeMap<UnitId, UnitId>,
    ) -> bool {
        let a = self.initial_map.rename_right(initial);
        let b = self.final_map.rename_right(final_);
        a || b
    }

    /// Register a unit created by a transform.
    pub fn add_unit(&mut self, unit: UnitId) -> CompileResult<()> {
        if self.initial_map.get_left(&unit).is_some() || self.final_map.get_left(&unit).is_some()
        {
            return Err(CompileError::UnitMapMismatch(format!(
                "Unit {unit} already appears in the unit maps"
            )));
        }
        if self.initial_map.get_right(&unit).is_some() || self.final_map.get_right(&unit).is_some()
        {
            return Err(CompileError::UnitMapMismatch(format!(
                "Unit {unit} is already tracked as an original unit"
            )));
        }
        self.initial_map.insert(unit.clone(), unit.clone());
        self.final_map.insert(unit.clone(), unit);
        Ok(())
    }

    /// Forget a unit removed from the circuit.
    pub fn remove_unit(&mut self, unit: &UnitId) -> bool {
        let a = self.initial_map.remove_right(unit).is_some();
        let b = self.final_map.remove_right(unit).is_some();
        a || b
    }
}

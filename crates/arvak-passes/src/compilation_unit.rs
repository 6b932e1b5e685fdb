//! The compilation unit: a circuit under compilation plus what is known
//! about it.

use std::collections::BTreeMap;
use std::fmt;

use arvak_circuit::Circuit;

use crate::error::{CompileError, CompileResult};
use crate::predicate::{Predicate, PredicateKind, PredicateMap, PredicatePtr, predicate_map};
use crate::unit_maps::{UnitBimap, UnitMaps};

/// Last known truth value of each predicate kind.
pub type PredicateCache = BTreeMap<PredicateKind, (PredicatePtr, bool)>;

/// A circuit being compiled.
///
/// Owns the circuit, the target predicates the compilation must reach, a
/// cache of predicate truths maintained by the passes, and the unit maps.
/// Passes take `&mut CompilationUnit`; the unit is never copied implicitly.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    circuit: Circuit,
    targets: PredicateMap,
    cache: PredicateCache,
    maps: UnitMaps,
}

impl CompilationUnit {
    /// Wrap a circuit with no target predicates.
    pub fn new(circuit: Circuit) -> Self {
        let maps = UnitMaps::identity(&circuit);
        Self {
            circuit,
            targets: PredicateMap::new(),
            cache: PredicateCache::new(),
            maps,
        }
    }

    /// Wrap a circuit and seed the cache by verifying each target.
    pub fn with_targets(
        circuit: Circuit,
        targets: impl IntoIterator<Item = PredicatePtr>,
    ) -> Self {
        let mut cu = Self::new(circuit);
        cu.targets = predicate_map(targets);
        cu.seed_cache();
        cu
    }

    /// The circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Take the circuit out of the unit.
    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }

    /// The target predicates.
    pub fn targets(&self) -> &PredicateMap {
        &self.targets
    }

    /// The rename context.
    pub fn maps(&self) -> &UnitMaps {
        &self.maps
    }

    /// Original unit to initial placement.
    pub fn initial_map(&self) -> &UnitBimap {
        &self.maps.initial_map
    }

    /// Original unit to final unit.
    pub fn final_map(&self) -> &UnitBimap {
        &self.maps.final_map
    }

    /// Verify a predicate against the circuit, ignoring the cache.
    pub fn calc_predicate(&self, predicate: &dyn Predicate) -> bool {
        predicate.verify(&self.circuit)
    }

    /// Verify every target predicate.
    pub fn check_all_predicates(&self) -> bool {
        self.targets.values().all(|p| self.calc_predicate(p.as_ref()))
    }

    /// Seed the cache by verifying each target.
    ///
    /// Fails with [`CompileError::CacheAlreadyInitialized`] if the cache
    /// already holds entries.
    pub fn initialize_cache(&mut self) -> CompileResult<()> {
        if !self.cache.is_empty() {
            return Err(CompileError::CacheAlreadyInitialized);
        }
        self.seed_cache();
        Ok(())
    }

    fn seed_cache(&mut self) {
        for (kind, pred) in &self.targets {
            let truth = pred.verify(&self.circuit);
            self.cache.insert(*kind, (pred.clone(), truth));
        }
    }

    /// Cached predicate of a kind and its presumed truth.
    pub fn cached(&self, kind: PredicateKind) -> Option<(&PredicatePtr, bool)> {
        self.cache.get(&kind).map(|(p, truth)| (p, *truth))
    }

    /// Number of cache entries.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn cache_mut(&mut self) -> &mut PredicateCache {
        &mut self.cache
    }

    /// The circuit and rename context, for a transform to mutate together.
    pub(crate) fn parts_mut(&mut self) -> (&mut Circuit, &mut UnitMaps) {
        (&mut self.circuit, &mut self.maps)
    }
}

impl fmt::Display for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "~~~CompilationUnit~~~")?;
        writeln!(f, "{}", self.circuit)?;
        writeln!(f, "Target Predicates:")?;
        for pred in self.targets.values() {
            writeln!(f, "  {}", pred.description())?;
        }
        writeln!(f, "Predicate Cache:")?;
        for (pred, truth) in self.cache.values() {
            writeln!(f, "  {}: {truth}", pred.description())?;
        }
        writeln!(f, "Initial Map: {}", self.maps.initial_map)?;
        write!(f, "Final Map: {}", self.maps.final_map)
    }
}

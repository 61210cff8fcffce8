//! Sets of hash computations an ancestor would like available.

use std::collections::HashSet;

use indexmap::IndexSet;
use strata_plan::Symbol;

use super::HashComputation;

/// Hash computations wanted at one tree position.
///
/// Iteration follows insertion order, so fan-in operators that allocate one
/// symbol per member do so reproducibly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashComputationSet {
    hashes: IndexSet<HashComputation>,
}

impl HashComputationSet {
    /// The empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Members, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &HashComputation> {
        self.hashes.iter()
    }

    /// Whether `hash` is a member.
    pub fn contains(&self, hash: &HashComputation) -> bool {
        self.hashes.contains(hash)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Keep only the members computable from `symbols`.
    #[must_use]
    pub fn prune_symbols(&self, symbols: &[Symbol]) -> Self {
        let available: HashSet<Symbol> = symbols.iter().cloned().collect();
        Self {
            hashes: self
                .hashes
                .iter()
                .filter(|hash| hash.can_compute_with(&available))
                .cloned()
                .collect(),
        }
    }

    /// Rename every member through `translator`, dropping those that cannot be renamed.
    #[must_use]
    pub fn translate<F>(&self, translator: F) -> Self
    where
        F: Fn(&Symbol) -> Option<Symbol>,
    {
        Self {
            hashes: self
                .hashes
                .iter()
                .filter_map(|hash| hash.translate(&translator))
                .collect(),
        }
    }

    /// This set plus `hash`, if any.
    #[must_use]
    pub fn with_hash_computation(&self, hash: Option<HashComputation>) -> Self {
        let mut hashes = self.hashes.clone();
        hashes.extend(hash);
        Self { hashes }
    }

    /// This set pruned to `outputs`, plus `hash`.
    #[must_use]
    pub fn with_hash_computation_for(
        &self,
        outputs: &[Symbol],
        hash: Option<HashComputation>,
    ) -> Self {
        self.prune_symbols(outputs).with_hash_computation(hash)
    }
}

impl From<Option<HashComputation>> for HashComputationSet {
    fn from(hash: Option<HashComputation>) -> Self {
        Self {
            hashes: hash.into_iter().collect(),
        }
    }
}

impl From<HashComputation> for HashComputationSet {
    fn from(hash: HashComputation) -> Self {
        Some(hash).into()
    }
}

impl FromIterator<HashComputation> for HashComputationSet {
    fn from_iter<I: IntoIterator<Item = HashComputation>>(iter: I) -> Self {
        Self {
            hashes: iter.into_iter().collect(),
        }
    }
}

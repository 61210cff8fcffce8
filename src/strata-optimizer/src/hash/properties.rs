//! Bottom-up results of the hash rewrite.

use std::collections::HashMap;

use common_error::{StrataError, StrataResult};
use indexmap::IndexMap;
use strata_plan::{PlanNode, Symbol};

use super::HashComputation;

/// Bijective map from hash computation to the symbol holding it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashSymbolMap {
    forward: IndexMap<HashComputation, Symbol>,
    reverse: HashMap<Symbol, HashComputation>,
}

impl HashSymbolMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `hash` to `symbol`.
    ///
    /// Rebinding a hash replaces its symbol. Binding a symbol that already
    /// holds a different hash is an internal error.
    pub fn insert(&mut self, hash: HashComputation, symbol: Symbol) -> StrataResult<()> {
        if let Some(existing) = self.reverse.get(&symbol) {
            if *existing != hash {
                return Err(StrataError::internal(format!(
                    "symbol {symbol} already holds {existing}, cannot also hold {hash}"
                )));
            }
        }
        if let Some(previous) = self.forward.insert(hash.clone(), symbol.clone()) {
            self.reverse.remove(&previous);
        }
        self.reverse.insert(symbol, hash);
        Ok(())
    }

    /// Insert every binding of `other`.
    pub fn extend_from(&mut self, other: &HashSymbolMap) -> StrataResult<()> {
        for (hash, symbol) in other.iter() {
            self.insert(hash.clone(), symbol.clone())?;
        }
        Ok(())
    }

    /// Symbol holding `hash`.
    pub fn get(&self, hash: &HashComputation) -> Option<&Symbol> {
        self.forward.get(hash)
    }

    /// Hash held by `symbol`.
    pub fn hash_for(&self, symbol: &Symbol) -> Option<&HashComputation> {
        self.reverse.get(symbol)
    }

    /// Whether `hash` is bound.
    pub fn contains_key(&self, hash: &HashComputation) -> bool {
        self.forward.contains_key(hash)
    }

    /// Whether `symbol` holds some hash.
    pub fn contains_symbol(&self, symbol: &Symbol) -> bool {
        self.reverse.contains_key(symbol)
    }

    /// Bound hashes, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &HashComputation> {
        self.forward.keys()
    }

    /// Hash symbols, in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Symbol> {
        self.forward.values()
    }

    /// Bindings, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&HashComputation, &Symbol)> {
        self.forward.iter()
    }

    /// Keep only the bindings for which `keep` holds.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&HashComputation, &Symbol) -> bool,
    {
        self.forward.retain(|hash, symbol| keep(hash, symbol));
        let forward = &self.forward;
        self.reverse.retain(|symbol, hash| forward.get(hash) == Some(symbol));
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// A rewritten node together with the hashes it makes available.
#[derive(Debug, Clone)]
pub struct PlanWithProperties {
    node: PlanNode,
    hash_symbols: HashSymbolMap,
}

impl PlanWithProperties {
    /// Pair `node` with its hash symbols.
    pub fn new(node: PlanNode, hash_symbols: HashSymbolMap) -> Self {
        Self { node, hash_symbols }
    }

    /// `node` offering no hashes.
    pub fn without_hashes(node: PlanNode) -> Self {
        Self::new(node, HashSymbolMap::new())
    }

    /// The rewritten node.
    pub fn node(&self) -> &PlanNode {
        &self.node
    }

    /// Hashes available in the node's output.
    pub fn hash_symbols(&self) -> &HashSymbolMap {
        &self.hash_symbols
    }

    /// Symbol holding `hash`; its absence is an internal error.
    pub fn required_hash_symbol(&self, hash: &HashComputation) -> StrataResult<Symbol> {
        self.hash_symbols
            .get(hash)
            .cloned()
            .ok_or_else(|| StrataError::internal(format!("No hash symbol generated for {hash}")))
    }

    /// Discard the hash map.
    pub fn into_node(self) -> PlanNode {
        self.node
    }

    /// Split into node and hash map.
    pub fn into_parts(self) -> (PlanNode, HashSymbolMap) {
        (self.node, self.hash_symbols)
    }
}

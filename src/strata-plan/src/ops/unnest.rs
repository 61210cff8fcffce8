//! Unnest operator.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::PlanNode;
use crate::{PlanNodeId, Symbol};

/// Explodes array columns into rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnnestNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    /// Source columns copied onto every exploded row.
    pub replicate_symbols: Vec<Symbol>,
    /// Array column → the element columns it explodes into.
    pub unnest_symbols: IndexMap<Symbol, Vec<Symbol>>,
    /// Produced element-position column.
    pub ordinality_symbol: Option<Symbol>,
}

impl UnnestNode {
    /// Replicated columns, element columns, then ordinality.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        self.replicate_symbols
            .iter()
            .chain(self.unnest_symbols.values().flatten())
            .chain(self.ordinality_symbol.iter())
            .cloned()
            .collect()
    }
}

//! Union operator.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::PlanNode;
use crate::{PlanNodeId, Symbol};

/// Multiset union of several sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionNode {
    pub id: PlanNodeId,
    /// Inputs.
    pub sources: Vec<PlanNode>,
    /// Output column → the feeding column of each source, by source index.
    pub symbol_mapping: IndexMap<Symbol, Vec<Symbol>>,
}

impl UnionNode {
    /// Output columns, in mapping order.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        self.symbol_mapping.keys().cloned().collect()
    }

    /// Output column → column of source `source_index`.
    pub fn output_to_input(&self, source_index: usize) -> HashMap<Symbol, Symbol> {
        self.symbol_mapping
            .iter()
            .filter_map(|(output, inputs)| {
                inputs
                    .get(source_index)
                    .map(|input| (output.clone(), input.clone()))
            })
            .collect()
    }
}

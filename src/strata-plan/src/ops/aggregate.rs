//! Grouping and distinct operators.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::PlanNode;
use crate::{PlanNodeId, Symbol};

/// Phase of a split aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AggregationStep {
    /// Whole aggregation in one operator.
    #[default]
    Single,
    /// Worker-local pre-aggregation.
    Partial,
    /// Merge of partial states.
    Intermediate,
    /// Final merge producing results.
    Final,
}

/// One aggregate function call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateCall {
    pub function: String,
    pub arguments: Vec<Symbol>,
    /// `DISTINCT` aggregate.
    pub distinct: bool,
}

impl AggregateCall {
    /// Non-distinct call of `function` over `arguments`.
    pub fn new(function: impl Into<String>, arguments: Vec<Symbol>) -> Self {
        Self {
            function: function.into(),
            arguments,
            distinct: false,
        }
    }
}

/// Grouped aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    pub aggregations: IndexMap<Symbol, AggregateCall>,
    /// Grouping keys; empty for a global aggregation.
    pub grouping_keys: Vec<Symbol>,
    /// Keys the input is already grouped on.
    pub pre_grouped_symbols: Vec<Symbol>,
    pub step: AggregationStep,
    /// Column holding the precomputed hash of the grouping keys.
    pub hash_symbol: Option<Symbol>,
    /// Grouping-set id column, when fed by a `GroupId`.
    pub group_id_symbol: Option<Symbol>,
}

impl AggregationNode {
    /// Whether the input arrives fully grouped, so groups can be streamed.
    pub fn is_streamable(&self) -> bool {
        !self.pre_grouped_symbols.is_empty()
            && self.pre_grouped_symbols.iter().collect::<HashSet<_>>()
                == self.grouping_keys.iter().collect::<HashSet<_>>()
    }

    /// Keys, then the hash column, then the aggregates.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        self.grouping_keys
            .iter()
            .chain(self.hash_symbol.iter())
            .chain(self.aggregations.keys())
            .cloned()
            .collect()
    }
}

/// Replicates rows once per grouping set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupIdNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    /// Grouping sets, in terms of output grouping columns.
    pub grouping_sets: Vec<Vec<Symbol>>,
    /// Output grouping column → source column.
    pub grouping_columns: IndexMap<Symbol, Symbol>,
    /// Source columns passed through for the aggregates.
    pub aggregation_arguments: Vec<Symbol>,
    /// Produced grouping-set id column.
    pub group_id_symbol: Symbol,
}

impl GroupIdNode {
    /// Grouping columns (first-seen order), aggregation arguments, group id.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        let mut outputs: Vec<Symbol> = Vec::new();
        for symbol in self.grouping_sets.iter().flatten() {
            if !outputs.contains(symbol) {
                outputs.push(symbol.clone());
            }
        }
        outputs.extend(self.aggregation_arguments.iter().cloned());
        outputs.push(self.group_id_symbol.clone());
        outputs
    }
}

/// `SELECT DISTINCT ... LIMIT n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinctLimitNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    pub limit: u64,
    /// Worker-local half of a split distinct limit.
    pub partial: bool,
    pub distinct_symbols: Vec<Symbol>,
    /// Column holding the precomputed hash of the distinct columns.
    pub hash_symbol: Option<Symbol>,
}

impl DistinctLimitNode {
    /// Distinct columns followed by the hash column.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        self.distinct_symbols
            .iter()
            .chain(self.hash_symbol.iter())
            .cloned()
            .collect()
    }
}

/// Flags the first row of each distinct key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkDistinctNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    /// Produced boolean marker column.
    pub marker_symbol: Symbol,
    pub distinct_symbols: Vec<Symbol>,
    /// Column holding the precomputed hash of the distinct columns.
    pub hash_symbol: Option<Symbol>,
}

impl MarkDistinctNode {
    /// Source columns followed by the marker.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        let mut outputs = self.source.output_symbols();
        outputs.push(self.marker_symbol.clone());
        outputs
    }
}

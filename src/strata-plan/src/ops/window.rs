//! Window and row-numbering operators.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{OrderingScheme, PlanNode};
use crate::{PlanNodeId, Symbol};

/// `PARTITION BY ... ORDER BY ...` of a window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Specification {
    pub partition_by: Vec<Symbol>,
    /// Ordering within a partition.
    pub ordering: Option<OrderingScheme>,
}

impl Specification {
    /// Partition by `symbols`, unordered.
    pub fn partitioned_by(symbols: Vec<Symbol>) -> Self {
        Self {
            partition_by: symbols,
            ordering: None,
        }
    }
}

/// One window function call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowFunction {
    pub function: String,
    pub arguments: Vec<Symbol>,
}

/// Window functions over partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    pub specification: Specification,
    pub functions: IndexMap<Symbol, WindowFunction>,
    /// Column holding the precomputed hash of the partition columns.
    pub hash_symbol: Option<Symbol>,
    /// Partition columns the input is already partitioned on.
    pub pre_partitioned_inputs: Vec<Symbol>,
    /// Length of the ordering prefix the input is already sorted on.
    pub pre_sorted_order_prefix: usize,
}

/// Numbers rows within each partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowNumberNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    pub partition_by: Vec<Symbol>,
    /// Produced row number column.
    pub row_number_symbol: Symbol,
    /// Optional cap on rows kept per partition.
    pub max_row_count_per_partition: Option<u64>,
    /// Column holding the precomputed hash of the partition columns.
    pub hash_symbol: Option<Symbol>,
}

/// Top rows per partition by an ordering, numbered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopNRowNumberNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    pub specification: Specification,
    /// Row number column, produced unless partial.
    pub row_number_symbol: Symbol,
    /// Rows kept per partition.
    pub max_row_count_per_partition: u64,
    /// Worker-local half of a split operator.
    pub partial: bool,
    /// Column holding the precomputed hash of the partition columns.
    pub hash_symbol: Option<Symbol>,
}

impl WindowNode {
    /// Source columns followed by the window function outputs.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        let mut outputs = self.source.output_symbols();
        outputs.extend(self.functions.keys().cloned());
        outputs
    }
}

impl RowNumberNode {
    /// Source columns followed by the row number.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        let mut outputs = self.source.output_symbols();
        outputs.push(self.row_number_symbol.clone());
        outputs
    }
}

impl TopNRowNumberNode {
    /// Source columns, plus the row number unless this is the partial half.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        let mut outputs = self.source.output_symbols();
        if !self.partial {
            outputs.push(self.row_number_symbol.clone());
        }
        outputs
    }
}

//! Single-source operators that pass their input columns through.

use serde::{Deserialize, Serialize};

use super::{OrderingScheme, PlanNode};
use crate::expr::Expression;
use crate::{PlanNodeId, Symbol};

/// Keeps rows matching a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    /// Boolean predicate over source columns.
    pub predicate: Expression,
}

/// Returns at most `count` rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    pub count: u64,
    /// Whether this is the worker-local half of a split limit.
    pub partial: bool,
}

/// Sorts its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    pub ordering: OrderingScheme,
}

/// Top `count` rows by an ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopNNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    pub count: u64,
    pub ordering: OrderingScheme,
}

/// Query result: names and orders the final columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    /// User-visible column names.
    pub column_names: Vec<String>,
    /// Symbols backing each column.
    pub outputs: Vec<Symbol>,
}

/// Fails unless its input produces exactly one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforceSingleRowNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
}

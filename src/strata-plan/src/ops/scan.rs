//! Leaf operators.

use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::{PlanNodeId, Symbol};

/// Reads a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableScanNode {
    pub id: PlanNodeId,
    /// Qualified table name.
    pub table: String,
    /// Produced columns.
    pub outputs: Vec<Symbol>,
}

/// Inline rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuesNode {
    pub id: PlanNodeId,
    /// Produced columns.
    pub outputs: Vec<Symbol>,
    /// Row expressions, one per output column.
    pub rows: Vec<Vec<Expression>>,
}

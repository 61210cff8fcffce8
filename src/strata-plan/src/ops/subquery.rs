//! Correlated subquery operators. These never reach execution; a later
//! decorrelation pass must remove them.

use serde::{Deserialize, Serialize};

use super::PlanNode;
use crate::expr::Assignments;
use crate::{PlanNodeId, Symbol};

/// Evaluates subquery expressions per input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyNode {
    pub id: PlanNodeId,
    pub input: Box<PlanNode>,
    pub subquery: Box<PlanNode>,
    /// Subquery results appended to each input row.
    pub subquery_assignments: Assignments,
    /// Outer columns referenced by the subquery.
    pub correlation: Vec<Symbol>,
}

impl ApplyNode {
    /// Input columns followed by the subquery results.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        let mut outputs = self.input.output_symbols();
        outputs.extend(self.subquery_assignments.outputs());
        outputs
    }
}

/// Lateral join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LateralJoinType {
    /// Inner join.
    Inner,
    /// Left outer join.
    Left,
}

/// Joins each input row with a correlated subquery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateralJoinNode {
    pub id: PlanNodeId,
    pub input: Box<PlanNode>,
    pub subquery: Box<PlanNode>,
    /// Outer columns referenced by the subquery.
    pub correlation: Vec<Symbol>,
    pub join_type: LateralJoinType,
}

impl LateralJoinNode {
    /// Input columns followed by subquery columns.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        let mut outputs = self.input.output_symbols();
        outputs.extend(self.subquery.output_symbols());
        outputs
    }
}

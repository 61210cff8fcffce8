//! Projection operator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::PlanNode;
use crate::expr::Assignments;
use crate::{PlanNodeId, Symbol};

/// Computes its outputs from source columns, one assignment each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNode {
    pub id: PlanNodeId,
    pub source: Box<PlanNode>,
    /// Output assignments.
    pub assignments: Assignments,
}

impl ProjectNode {
    /// Outputs that plainly rename (or re-expose) a source column, mapped to
    /// that column.
    pub fn identity_translations(&self) -> HashMap<Symbol, Symbol> {
        self.assignments
            .iter()
            .filter_map(|(output, expression)| {
                expression
                    .as_symbol_ref()
                    .map(|input| (output.clone(), input.clone()))
            })
            .collect()
    }
}

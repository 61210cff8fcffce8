//! Join operators.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::PlanNode;
use crate::expr::Expression;
use crate::{PlanNodeId, Symbol};

/// Join type of an equi-join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    /// Inner join.
    Inner,
    /// Left outer join.
    Left,
    /// Right outer join.
    Right,
    /// Full outer join.
    Full,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "INNER"),
            Self::Left => write!(f, "LEFT"),
            Self::Right => write!(f, "RIGHT"),
            Self::Full => write!(f, "FULL"),
        }
    }
}

/// `left = right` join criterion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquiJoinClause {
    /// Left-side column.
    pub left: Symbol,
    /// Right-side column.
    pub right: Symbol,
}

impl EquiJoinClause {
    /// Clause `left = right`.
    pub fn new(left: Symbol, right: Symbol) -> Self {
        Self { left, right }
    }
}

/// How join inputs are laid out across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinDistributionType {
    /// Both sides hash-partitioned on the join keys.
    Partitioned,
    /// Build side broadcast to every probe worker.
    Replicated,
}

/// Equi-join with an optional residual filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinNode {
    pub id: PlanNodeId,
    /// Join type.
    pub join_type: JoinType,
    /// Probe side.
    pub left: Box<PlanNode>,
    /// Build side.
    pub right: Box<PlanNode>,
    /// Equality criteria; empty for a cross or theta join.
    pub criteria: Vec<EquiJoinClause>,
    /// Exposed columns, drawn from both sides.
    pub output_symbols: Vec<Symbol>,
    /// Residual predicate.
    pub filter: Option<Expression>,
    /// Precomputed hash of the left criteria columns.
    pub left_hash_symbol: Option<Symbol>,
    /// Precomputed hash of the right criteria columns.
    pub right_hash_symbol: Option<Symbol>,
    /// Chosen distribution, if decided.
    pub distribution_type: Option<JoinDistributionType>,
    /// Whether the build side may spill.
    pub spillable: Option<bool>,
}

/// Marks source rows whose key appears in the filtering source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemiJoinNode {
    pub id: PlanNodeId,
    /// Probe side.
    pub source: Box<PlanNode>,
    /// Build side.
    pub filtering_source: Box<PlanNode>,
    /// Probe key.
    pub source_join_symbol: Symbol,
    /// Build key.
    pub filtering_source_join_symbol: Symbol,
    /// Produced boolean match column.
    pub semi_join_output: Symbol,
    /// Precomputed hash of the probe key.
    pub source_hash_symbol: Option<Symbol>,
    /// Precomputed hash of the build key.
    pub filtering_source_hash_symbol: Option<Symbol>,
    /// Chosen distribution, if decided.
    pub distribution_type: Option<JoinDistributionType>,
}

impl SemiJoinNode {
    /// Source columns followed by the match column.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        let mut outputs = self.source.output_symbols();
        outputs.push(self.semi_join_output.clone());
        outputs
    }
}

/// Spatial join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpatialJoinType {
    /// Inner join.
    Inner,
    /// Left outer join.
    Left,
}

/// Join on a spatial predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialJoinNode {
    pub id: PlanNodeId,
    /// Join type.
    pub join_type: SpatialJoinType,
    /// Probe side.
    pub left: Box<PlanNode>,
    /// Build side.
    pub right: Box<PlanNode>,
    /// Exposed columns, drawn from both sides.
    pub output_symbols: Vec<Symbol>,
    /// Spatial predicate.
    pub filter: Expression,
}

/// Index join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexJoinType {
    /// Inner join.
    Inner,
    /// Probe rows kept when the index has no match.
    SourceOuter,
}

/// `probe = index` index join criterion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexJoinClause {
    /// Probe-side column.
    pub probe: Symbol,
    /// Index-side column.
    pub index: Symbol,
}

impl IndexJoinClause {
    /// Clause `probe = index`.
    pub fn new(probe: Symbol, index: Symbol) -> Self {
        Self { probe, index }
    }
}

/// Join that looks probe keys up in an index source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexJoinNode {
    pub id: PlanNodeId,
    /// Join type.
    pub join_type: IndexJoinType,
    /// Probe side.
    pub probe_source: Box<PlanNode>,
    /// Index side.
    pub index_source: Box<PlanNode>,
    /// Equality criteria.
    pub criteria: Vec<IndexJoinClause>,
    /// Precomputed hash of the probe criteria columns.
    pub probe_hash_symbol: Option<Symbol>,
    /// Precomputed hash of the index criteria columns.
    pub index_hash_symbol: Option<Symbol>,
}

impl IndexJoinNode {
    /// Probe columns followed by index columns.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        let mut outputs = self.probe_source.output_symbols();
        outputs.extend(self.index_source.output_symbols());
        outputs
    }
}

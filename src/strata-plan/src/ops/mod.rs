//! Plan operators.
//!
//! [`PlanNode`] is a closed sum type: every pass matches on it exhaustively,
//! so a new operator kind cannot be added without visiting each pass.

mod aggregate;
mod exchange;
mod join;
mod ordering;
mod project;
mod scan;
mod simple;
mod subquery;
mod union;
mod unnest;
mod window;

pub use aggregate::{
    AggregateCall, AggregationNode, AggregationStep, DistinctLimitNode, GroupIdNode,
    MarkDistinctNode,
};
pub use exchange::{
    ArgumentBinding, ExchangeNode, ExchangeScope, ExchangeType, Partitioning, PartitioningHandle,
    PartitioningScheme,
};
pub use join::{
    EquiJoinClause, IndexJoinClause, IndexJoinNode, IndexJoinType, JoinDistributionType,
    JoinNode, JoinType, SemiJoinNode, SpatialJoinNode, SpatialJoinType,
};
pub use ordering::{OrderingScheme, SortOrder};
pub use project::ProjectNode;
pub use scan::{TableScanNode, ValuesNode};
pub use simple::{EnforceSingleRowNode, FilterNode, LimitNode, OutputNode, SortNode, TopNNode};
pub use subquery::{ApplyNode, LateralJoinNode, LateralJoinType};
pub use union::UnionNode;
pub use unnest::UnnestNode;
pub use window::{RowNumberNode, Specification, TopNRowNumberNode, WindowFunction, WindowNode};

use common_error::{ensure, StrataError, StrataResult};
use serde::{Deserialize, Serialize};

use crate::{PlanNodeId, Symbol};

/// A node of a relational plan tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanNode {
    /// Table read.
    TableScan(TableScanNode),
    /// Inline rows.
    Values(ValuesNode),
    /// Row filter.
    Filter(FilterNode),
    /// Row limit.
    Limit(LimitNode),
    /// Sort.
    Sort(SortNode),
    /// Top N by ordering.
    TopN(TopNNode),
    /// Query output.
    Output(OutputNode),
    /// Single-row assertion.
    EnforceSingleRow(EnforceSingleRowNode),
    /// Correlated subquery evaluation.
    Apply(ApplyNode),
    /// Correlated lateral join.
    LateralJoin(LateralJoinNode),
    /// Grouped aggregation.
    Aggregation(AggregationNode),
    /// Grouping-set expansion.
    GroupId(GroupIdNode),
    /// Distinct with limit.
    DistinctLimit(DistinctLimitNode),
    /// Distinct marker.
    MarkDistinct(MarkDistinctNode),
    /// Row numbering.
    RowNumber(RowNumberNode),
    /// Top N per partition.
    TopNRowNumber(TopNRowNumberNode),
    /// Window functions.
    Window(WindowNode),
    /// Equi-join.
    Join(JoinNode),
    /// Semi-join.
    SemiJoin(SemiJoinNode),
    /// Spatial join.
    SpatialJoin(SpatialJoinNode),
    /// Index join.
    IndexJoin(IndexJoinNode),
    /// Stage boundary.
    Exchange(ExchangeNode),
    /// Multiset union.
    Union(UnionNode),
    /// Projection.
    Project(ProjectNode),
    /// Array explosion.
    Unnest(UnnestNode),
}

impl PlanNode {
    /// Stable identity of this node.
    pub fn id(&self) -> PlanNodeId {
        match self {
            Self::TableScan(node) => node.id,
            Self::Values(node) => node.id,
            Self::Filter(node) => node.id,
            Self::Limit(node) => node.id,
            Self::Sort(node) => node.id,
            Self::TopN(node) => node.id,
            Self::Output(node) => node.id,
            Self::EnforceSingleRow(node) => node.id,
            Self::Apply(node) => node.id,
            Self::LateralJoin(node) => node.id,
            Self::Aggregation(node) => node.id,
            Self::GroupId(node) => node.id,
            Self::DistinctLimit(node) => node.id,
            Self::MarkDistinct(node) => node.id,
            Self::RowNumber(node) => node.id,
            Self::TopNRowNumber(node) => node.id,
            Self::Window(node) => node.id,
            Self::Join(node) => node.id,
            Self::SemiJoin(node) => node.id,
            Self::SpatialJoin(node) => node.id,
            Self::IndexJoin(node) => node.id,
            Self::Exchange(node) => node.id,
            Self::Union(node) => node.id,
            Self::Project(node) => node.id,
            Self::Unnest(node) => node.id,
        }
    }

    /// Operator name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TableScan(_) => "TableScan",
            Self::Values(_) => "Values",
            Self::Filter(_) => "Filter",
            Self::Limit(_) => "Limit",
            Self::Sort(_) => "Sort",
            Self::TopN(_) => "TopN",
            Self::Output(_) => "Output",
            Self::EnforceSingleRow(_) => "EnforceSingleRow",
            Self::Apply(_) => "Apply",
            Self::LateralJoin(_) => "LateralJoin",
            Self::Aggregation(_) => "Aggregation",
            Self::GroupId(_) => "GroupId",
            Self::DistinctLimit(_) => "DistinctLimit",
            Self::MarkDistinct(_) => "MarkDistinct",
            Self::RowNumber(_) => "RowNumber",
            Self::TopNRowNumber(_) => "TopNRowNumber",
            Self::Window(_) => "Window",
            Self::Join(_) => "Join",
            Self::SemiJoin(_) => "SemiJoin",
            Self::SpatialJoin(_) => "SpatialJoin",
            Self::IndexJoin(_) => "IndexJoin",
            Self::Exchange(_) => "Exchange",
            Self::Union(_) => "Union",
            Self::Project(_) => "Project",
            Self::Unnest(_) => "Unnest",
        }
    }

    /// Columns this node produces, in order.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        match self {
            Self::TableScan(node) => node.outputs.clone(),
            Self::Values(node) => node.outputs.clone(),
            Self::Filter(node) => node.source.output_symbols(),
            Self::Limit(node) => node.source.output_symbols(),
            Self::Sort(node) => node.source.output_symbols(),
            Self::TopN(node) => node.source.output_symbols(),
            Self::EnforceSingleRow(node) => node.source.output_symbols(),
            Self::Output(node) => node.outputs.clone(),
            Self::Apply(node) => node.output_symbols(),
            Self::LateralJoin(node) => node.output_symbols(),
            Self::Aggregation(node) => node.output_symbols(),
            Self::GroupId(node) => node.output_symbols(),
            Self::DistinctLimit(node) => node.output_symbols(),
            Self::MarkDistinct(node) => node.output_symbols(),
            Self::RowNumber(node) => node.output_symbols(),
            Self::TopNRowNumber(node) => node.output_symbols(),
            Self::Window(node) => node.output_symbols(),
            Self::Join(node) => node.output_symbols.clone(),
            Self::SemiJoin(node) => node.output_symbols(),
            Self::SpatialJoin(node) => node.output_symbols.clone(),
            Self::IndexJoin(node) => node.output_symbols(),
            Self::Exchange(node) => node.partitioning_scheme.output_layout.clone(),
            Self::Union(node) => node.output_symbols(),
            Self::Project(node) => node.assignments.outputs(),
            Self::Unnest(node) => node.output_symbols(),
        }
    }

    /// Child nodes, in order.
    pub fn sources(&self) -> Vec<&PlanNode> {
        match self {
            Self::TableScan(_) | Self::Values(_) => vec![],
            Self::Filter(node) => vec![&node.source],
            Self::Limit(node) => vec![&node.source],
            Self::Sort(node) => vec![&node.source],
            Self::TopN(node) => vec![&node.source],
            Self::Output(node) => vec![&node.source],
            Self::EnforceSingleRow(node) => vec![&node.source],
            Self::Apply(node) => vec![&node.input, &node.subquery],
            Self::LateralJoin(node) => vec![&node.input, &node.subquery],
            Self::Aggregation(node) => vec![&node.source],
            Self::GroupId(node) => vec![&node.source],
            Self::DistinctLimit(node) => vec![&node.source],
            Self::MarkDistinct(node) => vec![&node.source],
            Self::RowNumber(node) => vec![&node.source],
            Self::TopNRowNumber(node) => vec![&node.source],
            Self::Window(node) => vec![&node.source],
            Self::Join(node) => vec![&node.left, &node.right],
            Self::SemiJoin(node) => vec![&node.source, &node.filtering_source],
            Self::SpatialJoin(node) => vec![&node.left, &node.right],
            Self::IndexJoin(node) => vec![&node.probe_source, &node.index_source],
            Self::Exchange(node) => node.sources.iter().collect(),
            Self::Union(node) => node.sources.iter().collect(),
            Self::Project(node) => vec![&node.source],
            Self::Unnest(node) => vec![&node.source],
        }
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::TableScan(_) | Self::Values(_))
    }

    /// Rebuild this node over new children, keeping every other attribute.
    ///
    /// The number of children must match.
    pub fn replace_sources(self, sources: Vec<PlanNode>) -> StrataResult<Self> {
        let expected = self.sources().len();
        ensure!(
            sources.len() == expected,
            InternalError: "{} expects {} sources, got {}", self.name(), expected, sources.len()
        );

        let mut sources = sources.into_iter();
        self.map_sources(|_| {
            sources
                .next()
                .ok_or_else(|| StrataError::internal("ran out of replacement sources"))
        })
    }

    /// Rebuild this node by passing each child, in order, through `f`.
    pub fn map_sources<F>(self, mut f: F) -> StrataResult<Self>
    where
        F: FnMut(PlanNode) -> StrataResult<PlanNode>,
    {
        let mapped = match self {
            Self::TableScan(_) | Self::Values(_) => self,
            Self::Filter(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::Filter(node)
            }
            Self::Limit(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::Limit(node)
            }
            Self::Sort(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::Sort(node)
            }
            Self::TopN(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::TopN(node)
            }
            Self::Output(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::Output(node)
            }
            Self::EnforceSingleRow(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::EnforceSingleRow(node)
            }
            Self::Apply(mut node) => {
                node.input = Box::new(f(*node.input)?);
                node.subquery = Box::new(f(*node.subquery)?);
                Self::Apply(node)
            }
            Self::LateralJoin(mut node) => {
                node.input = Box::new(f(*node.input)?);
                node.subquery = Box::new(f(*node.subquery)?);
                Self::LateralJoin(node)
            }
            Self::Aggregation(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::Aggregation(node)
            }
            Self::GroupId(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::GroupId(node)
            }
            Self::DistinctLimit(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::DistinctLimit(node)
            }
            Self::MarkDistinct(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::MarkDistinct(node)
            }
            Self::RowNumber(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::RowNumber(node)
            }
            Self::TopNRowNumber(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::TopNRowNumber(node)
            }
            Self::Window(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::Window(node)
            }
            Self::Join(mut node) => {
                node.left = Box::new(f(*node.left)?);
                node.right = Box::new(f(*node.right)?);
                Self::Join(node)
            }
            Self::SemiJoin(mut node) => {
                node.source = Box::new(f(*node.source)?);
                node.filtering_source = Box::new(f(*node.filtering_source)?);
                Self::SemiJoin(node)
            }
            Self::SpatialJoin(mut node) => {
                node.left = Box::new(f(*node.left)?);
                node.right = Box::new(f(*node.right)?);
                Self::SpatialJoin(node)
            }
            Self::IndexJoin(mut node) => {
                node.probe_source = Box::new(f(*node.probe_source)?);
                node.index_source = Box::new(f(*node.index_source)?);
                Self::IndexJoin(node)
            }
            Self::Exchange(mut node) => {
                node.sources = std::mem::take(&mut node.sources)
                    .into_iter()
                    .map(&mut f)
                    .collect::<StrataResult<_>>()?;
                Self::Exchange(node)
            }
            Self::Union(mut node) => {
                node.sources = std::mem::take(&mut node.sources)
                    .into_iter()
                    .map(&mut f)
                    .collect::<StrataResult<_>>()?;
                Self::Union(node)
            }
            Self::Project(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::Project(node)
            }
            Self::Unnest(mut node) => {
                node.source = Box::new(f(*node.source)?);
                Self::Unnest(node)
            }
        };
        Ok(mapped)
    }
}

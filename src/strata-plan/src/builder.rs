//! Fluent construction of plan trees.

use indexmap::IndexMap;

use crate::expr::{Assignments, Expression};
use crate::ops::{
    AggregateCall, AggregationNode, AggregationStep, ApplyNode, DistinctLimitNode,
    EnforceSingleRowNode, EquiJoinClause, ExchangeNode, ExchangeScope, ExchangeType, FilterNode,
    GroupIdNode, IndexJoinClause, IndexJoinNode, IndexJoinType, JoinNode, JoinType,
    LateralJoinNode, LateralJoinType, LimitNode, MarkDistinctNode, OrderingScheme, OutputNode,
    Partitioning, PartitioningHandle, PartitioningScheme, PlanNode, ProjectNode, RowNumberNode,
    SemiJoinNode, SortNode, SpatialJoinNode, SpatialJoinType, Specification, TableScanNode,
    TopNNode, TopNRowNumberNode, UnionNode, UnnestNode, ValuesNode, WindowFunction, WindowNode,
};
use crate::{DataType, PlanNodeId, PlanNodeIdAllocator, Symbol, SymbolAllocator, TypeProvider};

/// Builds plan nodes while owning the symbol and node-id allocators.
///
/// Every node gets a fresh id; every symbol minted through [`PlanBuilder::symbol`]
/// is registered with its type so the optimizer can see it.
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    symbols: SymbolAllocator,
    ids: PlanNodeIdAllocator,
}

impl PlanBuilder {
    /// Builder with empty allocators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from existing allocators.
    pub fn with_allocators(symbols: SymbolAllocator, ids: PlanNodeIdAllocator) -> Self {
        Self { symbols, ids }
    }

    /// Allocate a typed symbol.
    pub fn symbol(&mut self, hint: &str, data_type: DataType) -> Symbol {
        self.symbols.new_symbol(hint, data_type)
    }

    /// Allocate a node id.
    pub fn next_id(&mut self) -> PlanNodeId {
        self.ids.next_id()
    }

    /// Snapshot of the types of all allocated symbols.
    pub fn types(&self) -> TypeProvider {
        self.symbols.types()
    }

    /// Hand back the allocators, e.g. to seed an optimizer run.
    pub fn into_parts(self) -> (SymbolAllocator, PlanNodeIdAllocator) {
        (self.symbols, self.ids)
    }

    /// Table read producing `outputs`.
    pub fn table_scan(&mut self, table: impl Into<String>, outputs: Vec<Symbol>) -> PlanNode {
        PlanNode::TableScan(TableScanNode {
            id: self.next_id(),
            table: table.into(),
            outputs,
        })
    }

    /// Inline rows.
    pub fn values(&mut self, outputs: Vec<Symbol>, rows: Vec<Vec<Expression>>) -> PlanNode {
        PlanNode::Values(ValuesNode {
            id: self.next_id(),
            outputs,
            rows,
        })
    }

    /// Filter.
    pub fn filter(&mut self, source: PlanNode, predicate: Expression) -> PlanNode {
        PlanNode::Filter(FilterNode {
            id: self.next_id(),
            source: Box::new(source),
            predicate,
        })
    }

    /// Limit.
    pub fn limit(&mut self, source: PlanNode, count: u64) -> PlanNode {
        PlanNode::Limit(LimitNode {
            id: self.next_id(),
            source: Box::new(source),
            count,
            partial: false,
        })
    }

    /// Ascending sort on `keys`.
    pub fn sort(&mut self, source: PlanNode, keys: Vec<Symbol>) -> PlanNode {
        PlanNode::Sort(SortNode {
            id: self.next_id(),
            source: Box::new(source),
            ordering: OrderingScheme::ascending(keys),
        })
    }

    /// Top `count` rows by ascending `keys`.
    pub fn top_n(&mut self, source: PlanNode, count: u64, keys: Vec<Symbol>) -> PlanNode {
        PlanNode::TopN(TopNNode {
            id: self.next_id(),
            source: Box::new(source),
            count,
            ordering: OrderingScheme::ascending(keys),
        })
    }

    /// Query output exposing `outputs` under their own names.
    pub fn output(&mut self, source: PlanNode, outputs: Vec<Symbol>) -> PlanNode {
        PlanNode::Output(OutputNode {
            id: self.next_id(),
            source: Box::new(source),
            column_names: outputs.iter().map(|s| s.name().to_string()).collect(),
            outputs,
        })
    }

    /// Single-row assertion.
    pub fn enforce_single_row(&mut self, source: PlanNode) -> PlanNode {
        PlanNode::EnforceSingleRow(EnforceSingleRowNode {
            id: self.next_id(),
            source: Box::new(source),
        })
    }

    /// Correlated subquery.
    pub fn apply(
        &mut self,
        input: PlanNode,
        subquery: PlanNode,
        subquery_assignments: Assignments,
        correlation: Vec<Symbol>,
    ) -> PlanNode {
        PlanNode::Apply(ApplyNode {
            id: self.next_id(),
            input: Box::new(input),
            subquery: Box::new(subquery),
            subquery_assignments,
            correlation,
        })
    }

    /// Inner lateral join.
    pub fn lateral_join(
        &mut self,
        input: PlanNode,
        subquery: PlanNode,
        correlation: Vec<Symbol>,
    ) -> PlanNode {
        PlanNode::LateralJoin(LateralJoinNode {
            id: self.next_id(),
            input: Box::new(input),
            subquery: Box::new(subquery),
            correlation,
            join_type: LateralJoinType::Inner,
        })
    }

    /// Single-step aggregation grouped on `keys`.
    pub fn aggregation(
        &mut self,
        source: PlanNode,
        keys: Vec<Symbol>,
        aggregations: IndexMap<Symbol, AggregateCall>,
    ) -> PlanNode {
        PlanNode::Aggregation(AggregationNode {
            id: self.next_id(),
            source: Box::new(source),
            aggregations,
            grouping_keys: keys,
            pre_grouped_symbols: Vec::new(),
            step: AggregationStep::Single,
            hash_symbol: None,
            group_id_symbol: None,
        })
    }

    /// Grouping-set expansion where every grouping column keeps its name.
    pub fn group_id(
        &mut self,
        source: PlanNode,
        grouping_sets: Vec<Vec<Symbol>>,
        aggregation_arguments: Vec<Symbol>,
    ) -> PlanNode {
        let mut grouping_columns = IndexMap::new();
        for symbol in grouping_sets.iter().flatten() {
            grouping_columns.insert(symbol.clone(), symbol.clone());
        }
        let group_id_symbol = self.symbol("groupid", DataType::BigInt);
        PlanNode::GroupId(GroupIdNode {
            id: self.next_id(),
            source: Box::new(source),
            grouping_sets,
            grouping_columns,
            aggregation_arguments,
            group_id_symbol,
        })
    }

    /// `DISTINCT ... LIMIT`.
    pub fn distinct_limit(
        &mut self,
        source: PlanNode,
        distinct_symbols: Vec<Symbol>,
        limit: u64,
    ) -> PlanNode {
        PlanNode::DistinctLimit(DistinctLimitNode {
            id: self.next_id(),
            source: Box::new(source),
            limit,
            partial: false,
            distinct_symbols,
            hash_symbol: None,
        })
    }

    /// Distinct marker over `distinct_symbols`.
    pub fn mark_distinct(&mut self, source: PlanNode, distinct_symbols: Vec<Symbol>) -> PlanNode {
        let marker_symbol = self.symbol("is_distinct", DataType::Boolean);
        PlanNode::MarkDistinct(MarkDistinctNode {
            id: self.next_id(),
            source: Box::new(source),
            marker_symbol,
            distinct_symbols,
            hash_symbol: None,
        })
    }

    /// Row numbering within `partition_by`.
    pub fn row_number(&mut self, source: PlanNode, partition_by: Vec<Symbol>) -> PlanNode {
        let row_number_symbol = self.symbol("row_number", DataType::BigInt);
        PlanNode::RowNumber(RowNumberNode {
            id: self.next_id(),
            source: Box::new(source),
            partition_by,
            row_number_symbol,
            max_row_count_per_partition: None,
            hash_symbol: None,
        })
    }

    /// Top `max_rows` rows per partition by ascending `order_by`.
    pub fn top_n_row_number(
        &mut self,
        source: PlanNode,
        partition_by: Vec<Symbol>,
        order_by: Vec<Symbol>,
        max_rows: u64,
    ) -> PlanNode {
        let row_number_symbol = self.symbol("row_number", DataType::BigInt);
        PlanNode::TopNRowNumber(TopNRowNumberNode {
            id: self.next_id(),
            source: Box::new(source),
            specification: Specification {
                partition_by,
                ordering: Some(OrderingScheme::ascending(order_by)),
            },
            row_number_symbol,
            max_row_count_per_partition: max_rows,
            partial: false,
            hash_symbol: None,
        })
    }

    /// Window computing `rank()` over `partition_by`.
    pub fn window(&mut self, source: PlanNode, partition_by: Vec<Symbol>) -> PlanNode {
        let rank = self.symbol("rank", DataType::BigInt);
        let mut functions = IndexMap::new();
        functions.insert(
            rank,
            WindowFunction {
                function: "rank".to_string(),
                arguments: Vec::new(),
            },
        );
        PlanNode::Window(WindowNode {
            id: self.next_id(),
            source: Box::new(source),
            specification: Specification::partitioned_by(partition_by),
            functions,
            hash_symbol: None,
            pre_partitioned_inputs: Vec::new(),
            pre_sorted_order_prefix: 0,
        })
    }

    /// Equi-join exposing every column of both sides.
    pub fn join(
        &mut self,
        join_type: JoinType,
        left: PlanNode,
        right: PlanNode,
        criteria: Vec<EquiJoinClause>,
    ) -> PlanNode {
        let mut output_symbols = left.output_symbols();
        output_symbols.extend(right.output_symbols());
        PlanNode::Join(JoinNode {
            id: self.next_id(),
            join_type,
            left: Box::new(left),
            right: Box::new(right),
            criteria,
            output_symbols,
            filter: None,
            left_hash_symbol: None,
            right_hash_symbol: None,
            distribution_type: None,
            spillable: None,
        })
    }

    /// Semi-join of `source.source_key` against `filtering_source.filtering_key`.
    pub fn semi_join(
        &mut self,
        source: PlanNode,
        filtering_source: PlanNode,
        source_key: Symbol,
        filtering_key: Symbol,
    ) -> PlanNode {
        let semi_join_output = self.symbol("semijoinresult", DataType::Boolean);
        PlanNode::SemiJoin(SemiJoinNode {
            id: self.next_id(),
            source: Box::new(source),
            filtering_source: Box::new(filtering_source),
            source_join_symbol: source_key,
            filtering_source_join_symbol: filtering_key,
            semi_join_output,
            source_hash_symbol: None,
            filtering_source_hash_symbol: None,
            distribution_type: None,
        })
    }

    /// Inner spatial join exposing every column of both sides.
    pub fn spatial_join(&mut self, left: PlanNode, right: PlanNode, filter: Expression) -> PlanNode {
        let mut output_symbols = left.output_symbols();
        output_symbols.extend(right.output_symbols());
        PlanNode::SpatialJoin(SpatialJoinNode {
            id: self.next_id(),
            join_type: SpatialJoinType::Inner,
            left: Box::new(left),
            right: Box::new(right),
            output_symbols,
            filter,
        })
    }

    /// Index join.
    pub fn index_join(
        &mut self,
        join_type: IndexJoinType,
        probe_source: PlanNode,
        index_source: PlanNode,
        criteria: Vec<IndexJoinClause>,
    ) -> PlanNode {
        PlanNode::IndexJoin(IndexJoinNode {
            id: self.next_id(),
            join_type,
            probe_source: Box::new(probe_source),
            index_source: Box::new(index_source),
            criteria,
            probe_hash_symbol: None,
            index_hash_symbol: None,
        })
    }

    /// Remote repartition of `source` hashed on `keys`.
    pub fn repartition(&mut self, source: PlanNode, keys: Vec<Symbol>) -> PlanNode {
        let layout = source.output_symbols();
        self.exchange(
            ExchangeType::Repartition,
            Partitioning::on_columns(PartitioningHandle::FixedHash, keys),
            layout,
            vec![source],
        )
    }

    /// Remote gather of all `sources` onto one worker.
    ///
    /// Every source must produce the same columns as the first, in order.
    pub fn gather(&mut self, sources: Vec<PlanNode>) -> PlanNode {
        let layout = sources
            .first()
            .map(PlanNode::output_symbols)
            .unwrap_or_default();
        self.exchange(
            ExchangeType::Gather,
            Partitioning::on_columns(PartitioningHandle::Single, []),
            layout,
            sources,
        )
    }

    /// Remote exchange; each source feeds the layout positionally from its outputs.
    pub fn exchange(
        &mut self,
        exchange_type: ExchangeType,
        partitioning: Partitioning,
        output_layout: Vec<Symbol>,
        sources: Vec<PlanNode>,
    ) -> PlanNode {
        let width = output_layout.len();
        let inputs = sources
            .iter()
            .map(|source| source.output_symbols().into_iter().take(width).collect())
            .collect();
        PlanNode::Exchange(ExchangeNode {
            id: self.next_id(),
            exchange_type,
            scope: ExchangeScope::Remote,
            partitioning_scheme: PartitioningScheme::new(partitioning, output_layout),
            sources,
            inputs,
            ordering_scheme: None,
        })
    }

    /// Union with an explicit output → per-source symbol mapping.
    pub fn union(
        &mut self,
        sources: Vec<PlanNode>,
        symbol_mapping: IndexMap<Symbol, Vec<Symbol>>,
    ) -> PlanNode {
        PlanNode::Union(UnionNode {
            id: self.next_id(),
            sources,
            symbol_mapping,
        })
    }

    /// Projection.
    pub fn project(&mut self, source: PlanNode, assignments: Assignments) -> PlanNode {
        PlanNode::Project(ProjectNode {
            id: self.next_id(),
            source: Box::new(source),
            assignments,
        })
    }

    /// Identity projection of `symbols`.
    pub fn identity_project(&mut self, source: PlanNode, symbols: &[Symbol]) -> PlanNode {
        self.project(source, Assignments::identity(symbols))
    }

    /// Unnest of array columns, each expanding into the listed symbols.
    pub fn unnest(
        &mut self,
        source: PlanNode,
        replicate_symbols: Vec<Symbol>,
        unnest_symbols: IndexMap<Symbol, Vec<Symbol>>,
    ) -> PlanNode {
        PlanNode::Unnest(UnnestNode {
            id: self.next_id(),
            source: Box::new(source),
            replicate_symbols,
            unnest_symbols,
            ordinality_symbol: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_allocates_ids_and_types() {
        let mut builder = PlanBuilder::new();
        let a = builder.symbol("a", DataType::Integer);
        let scan = builder.table_scan("t", vec![a.clone()]);
        let limit = builder.limit(scan, 5);

        assert_eq!(limit.id(), PlanNodeId::new(1));
        assert_eq!(limit.sources()[0].id(), PlanNodeId::new(0));
        assert_eq!(builder.types().get(&a), Some(&DataType::Integer));

        let (symbols, mut ids) = builder.into_parts();
        assert_eq!(symbols.type_of(&a), Some(&DataType::Integer));
        assert_eq!(ids.next_id(), PlanNodeId::new(2));
    }

    #[test]
    fn test_builder_join_exposes_both_sides() {
        let mut builder = PlanBuilder::new();
        let a = builder.symbol("a", DataType::Varchar);
        let b = builder.symbol("b", DataType::Varchar);
        let left = builder.table_scan("l", vec![a.clone()]);
        let right = builder.table_scan("r", vec![b.clone()]);
        let join = builder.join(
            JoinType::Inner,
            left,
            right,
            vec![EquiJoinClause::new(a.clone(), b.clone())],
        );
        assert_eq!(join.output_symbols(), vec![a, b]);
    }

    #[test]
    fn test_builder_repartition_inputs_follow_layout() {
        let mut builder = PlanBuilder::new();
        let a = builder.symbol("a", DataType::Varchar);
        let b = builder.symbol("b", DataType::Double);
        let scan = builder.table_scan("t", vec![a.clone(), b.clone()]);
        let exchange = builder.repartition(scan, vec![a.clone()]);

        let PlanNode::Exchange(node) = &exchange else {
            panic!("expected an exchange");
        };
        assert_eq!(node.inputs, vec![vec![a.clone(), b.clone()]]);
        assert!(node.partitioning_scheme.is_fixed_hash_on_columns());
        assert_eq!(exchange.output_symbols(), vec![a, b]);
    }
}

//! Plan-wide utilities: explain rendering and tree queries.

use common_display::{bracketed, DisplayTree, TreeNode};

use crate::ops::PlanNode;
use crate::Symbol;

impl PlanNode {
    /// Generate a tree-formatted explanation of the plan rooted here.
    pub fn explain(&self) -> String {
        DisplayTree::new(self).to_string()
    }

    /// Count the number of operators in the plan.
    pub fn operator_count(&self) -> usize {
        1 + self
            .sources()
            .into_iter()
            .map(PlanNode::operator_count)
            .sum::<usize>()
    }

    /// Get the maximum depth of the plan tree.
    pub fn depth(&self) -> usize {
        1 + self
            .sources()
            .into_iter()
            .map(PlanNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Check if any operator in the plan satisfies `predicate`.
    pub fn contains<F>(&self, predicate: F) -> bool
    where
        F: Fn(&PlanNode) -> bool,
    {
        fn check<F>(node: &PlanNode, predicate: &F) -> bool
        where
            F: Fn(&PlanNode) -> bool,
        {
            predicate(node) || node.sources().into_iter().any(|s| check(s, predicate))
        }
        check(self, &predicate)
    }

    /// All operators satisfying `predicate`, in pre-order.
    pub fn find_all<F>(&self, predicate: F) -> Vec<&PlanNode>
    where
        F: Fn(&PlanNode) -> bool,
    {
        fn collect<'a, F>(node: &'a PlanNode, predicate: &F, found: &mut Vec<&'a PlanNode>)
        where
            F: Fn(&PlanNode) -> bool,
        {
            if predicate(node) {
                found.push(node);
            }
            for source in node.sources() {
                collect(source, predicate, found);
            }
        }

        let mut found = Vec::new();
        collect(self, &predicate, &mut found);
        found
    }

    fn attributes(&self) -> Vec<String> {
        fn hash(symbol: &Option<Symbol>) -> Option<String> {
            symbol.as_ref().map(|s| format!("hash={s}"))
        }

        let attrs: Vec<Option<String>> = match self {
            Self::TableScan(node) => vec![Some(format!("table={}", node.table))],
            Self::Values(node) => vec![Some(format!("rows={}", node.rows.len()))],
            Self::Filter(node) => vec![Some(format!("predicate={}", node.predicate))],
            Self::Limit(node) => vec![
                Some(format!("count={}", node.count)),
                node.partial.then(|| "partial".to_string()),
            ],
            Self::Sort(node) => vec![Some(format!("order_by={}", bracketed(&node.ordering.symbols())))],
            Self::TopN(node) => vec![
                Some(format!("count={}", node.count)),
                Some(format!("order_by={}", bracketed(&node.ordering.symbols()))),
            ],
            Self::Output(node) => vec![Some(format!("columns={}", node.column_names.join(", ")))],
            Self::EnforceSingleRow(_) => vec![],
            Self::Apply(node) => vec![Some(format!("correlation={}", bracketed(&node.correlation)))],
            Self::LateralJoin(node) => {
                vec![Some(format!("correlation={}", bracketed(&node.correlation)))]
            }
            Self::Aggregation(node) => vec![
                Some(format!("keys={}", bracketed(&node.grouping_keys))),
                Some(format!("step={:?}", node.step)),
                hash(&node.hash_symbol),
            ],
            Self::GroupId(node) => vec![Some(format!("sets={}", node.grouping_sets.len()))],
            Self::DistinctLimit(node) => vec![
                Some(format!("limit={}", node.limit)),
                Some(format!("distinct={}", bracketed(&node.distinct_symbols))),
                hash(&node.hash_symbol),
            ],
            Self::MarkDistinct(node) => vec![
                Some(format!("marker={}", node.marker_symbol)),
                Some(format!("distinct={}", bracketed(&node.distinct_symbols))),
                hash(&node.hash_symbol),
            ],
            Self::RowNumber(node) => vec![
                Some(format!("partition_by={}", bracketed(&node.partition_by))),
                hash(&node.hash_symbol),
            ],
            Self::TopNRowNumber(node) => vec![
                Some(format!(
                    "partition_by={}",
                    bracketed(&node.specification.partition_by)
                )),
                Some(format!("limit={}", node.max_row_count_per_partition)),
                hash(&node.hash_symbol),
            ],
            Self::Window(node) => vec![
                Some(format!(
                    "partition_by={}",
                    bracketed(&node.specification.partition_by)
                )),
                hash(&node.hash_symbol),
            ],
            Self::Join(node) => {
                let criteria: Vec<String> = node
                    .criteria
                    .iter()
                    .map(|c| format!("{} = {}", c.left, c.right))
                    .collect();
                vec![
                    Some(node.join_type.to_string()),
                    Some(format!("criteria={}", bracketed(&criteria))),
                    hash(&node.left_hash_symbol).map(|h| format!("left_{h}")),
                    hash(&node.right_hash_symbol).map(|h| format!("right_{h}")),
                ]
            }
            Self::SemiJoin(node) => vec![
                Some(format!(
                    "{} = {}",
                    node.source_join_symbol, node.filtering_source_join_symbol
                )),
                hash(&node.source_hash_symbol).map(|h| format!("source_{h}")),
                hash(&node.filtering_source_hash_symbol).map(|h| format!("filtering_{h}")),
            ],
            Self::SpatialJoin(node) => vec![Some(format!("filter={}", node.filter))],
            Self::IndexJoin(node) => vec![
                Some(format!("{:?}", node.join_type)),
                hash(&node.probe_hash_symbol).map(|h| format!("probe_{h}")),
                hash(&node.index_hash_symbol).map(|h| format!("index_{h}")),
            ],
            Self::Exchange(node) => {
                let scheme = &node.partitioning_scheme;
                vec![
                    Some(format!("{:?}", node.exchange_type)),
                    Some(scheme.partitioning.handle.to_string()),
                    hash(&scheme.hash_column),
                ]
            }
            Self::Union(node) => vec![Some(format!("sources={}", node.sources.len()))],
            Self::Project(node) => {
                let assignments: Vec<String> = node
                    .assignments
                    .iter()
                    .filter(|(output, expression)| expression.as_symbol_ref() != Some(*output))
                    .map(|(output, expression)| format!("{output} := {expression}"))
                    .collect();
                vec![(!assignments.is_empty()).then(|| assignments.join(", "))]
            }
            Self::Unnest(node) => vec![Some(format!(
                "unnest={}",
                bracketed(&node.unnest_symbols.keys().cloned().collect::<Vec<_>>())
            ))],
        };
        attrs.into_iter().flatten().collect()
    }
}

impl TreeNode for PlanNode {
    fn label(&self) -> String {
        let attributes = self.attributes();
        if attributes.is_empty() {
            self.name().to_string()
        } else {
            format!("{}[{}]", self.name(), attributes.join(", "))
        }
    }

    fn children(&self) -> Vec<&dyn TreeNode> {
        self.sources()
            .into_iter()
            .map(|source| source as &dyn TreeNode)
            .collect()
    }

    fn details(&self) -> Vec<String> {
        vec![format!("outputs: {}", bracketed(&self.output_symbols()))]
    }
}

impl std::fmt::Display for PlanNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ComparisonOp, Expression, Literal};
    use crate::{DataType, PlanBuilder};

    fn sample() -> PlanNode {
        let mut builder = PlanBuilder::new();
        let a = builder.symbol("a", DataType::Varchar);
        let b = builder.symbol("b", DataType::BigInt);
        let scan = builder.table_scan("t", vec![a.clone(), b.clone()]);
        let filter = builder.filter(
            scan,
            Expression::compare(
                ComparisonOp::Gt,
                Expression::symbol(&b),
                Expression::Literal(Literal::Long(1)),
            ),
        );
        builder.aggregation(filter, vec![a], Default::default())
    }

    #[test]
    fn test_plan_metrics() {
        let plan = sample();
        assert_eq!(plan.operator_count(), 3);
        assert_eq!(plan.depth(), 3);
    }

    #[test]
    fn test_plan_explain() {
        let explain = sample().explain();
        let lines: Vec<_> = explain.lines().collect();
        assert_eq!(lines[0], "Aggregation[keys=[a], step=Single]");
        assert_eq!(lines[1], "│  outputs: [a]");
        assert_eq!(lines[2], "└─ Filter[predicate=(b > 1)]");
        assert!(explain.contains("TableScan[table=t]"));
    }

    #[test]
    fn test_plan_contains_and_find_all() {
        let plan = sample();
        assert!(plan.contains(|n| matches!(n, PlanNode::Filter(_))));
        assert!(!plan.contains(|n| matches!(n, PlanNode::Join(_))));

        let leaves = plan.find_all(PlanNode::is_leaf);
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].name(), "TableScan");
    }
}

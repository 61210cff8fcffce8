//! Symbol dependency validation for plan trees.
//!
//! Checks that every symbol an operator consumes is produced by the source it
//! reads from, and that multi-source operators have consistent input lists.

use std::collections::HashSet;
use std::fmt;

use common_error::{StrataError, StrataResult};

use crate::ops::{OrderingScheme, PlanNode};
use crate::{PlanNodeId, Symbol};

/// A dependency violation found in a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    /// An operator references a symbol its sources do not produce.
    MissingSymbol {
        /// Operator name.
        operator: &'static str,
        /// Operator id.
        id: PlanNodeId,
        /// What the symbol was used for.
        role: &'static str,
        /// The unresolved symbol.
        symbol: Symbol,
    },

    /// A per-source list does not line up with the operator's shape.
    ShapeMismatch {
        /// Operator name.
        operator: &'static str,
        /// Operator id.
        id: PlanNodeId,
        /// Description of the mismatch.
        message: String,
    },
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSymbol {
                operator,
                id,
                role,
                symbol,
            } => write!(
                f,
                "{operator} {id} uses {role} symbol {symbol} not produced by its source"
            ),
            Self::ShapeMismatch {
                operator,
                id,
                message,
            } => write!(f, "{operator} {id}: {message}"),
        }
    }
}

impl std::error::Error for DependencyError {}

/// Collects dependency violations over a whole plan.
#[derive(Debug, Default)]
pub struct DependencyValidator {
    errors: Vec<DependencyError>,
}

impl DependencyValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate every operator of `plan`.
    pub fn validate(mut self, plan: &PlanNode) -> Result<(), Vec<DependencyError>> {
        self.visit(plan);
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn visit(&mut self, node: &PlanNode) {
        self.check(node);
        for source in node.sources() {
            self.visit(source);
        }
    }

    fn require<'a>(
        &mut self,
        node: &PlanNode,
        role: &'static str,
        symbols: impl IntoIterator<Item = &'a Symbol>,
        available: &HashSet<Symbol>,
    ) {
        for symbol in symbols {
            if !available.contains(symbol) {
                self.errors.push(DependencyError::MissingSymbol {
                    operator: node.name(),
                    id: node.id(),
                    role,
                    symbol: symbol.clone(),
                });
            }
        }
    }

    fn mismatch(&mut self, node: &PlanNode, message: String) {
        self.errors.push(DependencyError::ShapeMismatch {
            operator: node.name(),
            id: node.id(),
            message,
        });
    }

    fn check(&mut self, node: &PlanNode) {
        match node {
            PlanNode::TableScan(_)
            | PlanNode::Values(_)
            | PlanNode::Limit(_)
            | PlanNode::EnforceSingleRow(_) => {}
            PlanNode::Filter(filter) => {
                let available = produced(&filter.source);
                self.require(node, "predicate", &filter.predicate.symbols(), &available);
            }
            PlanNode::Sort(sort) => {
                let available = produced(&sort.source);
                self.require(node, "ordering", &sort.ordering.symbols(), &available);
            }
            PlanNode::TopN(top_n) => {
                let available = produced(&top_n.source);
                self.require(node, "ordering", &top_n.ordering.symbols(), &available);
            }
            PlanNode::Output(output) => {
                let available = produced(&output.source);
                self.require(node, "output", &output.outputs, &available);
                if output.column_names.len() != output.outputs.len() {
                    self.mismatch(
                        node,
                        format!(
                            "{} column names for {} outputs",
                            output.column_names.len(),
                            output.outputs.len()
                        ),
                    );
                }
            }
            PlanNode::Apply(apply) => {
                let input = produced(&apply.input);
                self.require(node, "correlation", &apply.correlation, &input);
                let mut both = input;
                both.extend(apply.subquery.output_symbols());
                for (_, expression) in apply.subquery_assignments.iter() {
                    self.require(node, "assignment", &expression.symbols(), &both);
                }
            }
            PlanNode::LateralJoin(lateral) => {
                let input = produced(&lateral.input);
                self.require(node, "correlation", &lateral.correlation, &input);
            }
            PlanNode::Aggregation(aggregation) => {
                let available = produced(&aggregation.source);
                self.require(node, "grouping key", &aggregation.grouping_keys, &available);
                self.require(
                    node,
                    "pre-grouped",
                    &aggregation.pre_grouped_symbols,
                    &available,
                );
                self.require(node, "hash", &aggregation.hash_symbol, &available);
                self.require(node, "group id", &aggregation.group_id_symbol, &available);
                for call in aggregation.aggregations.values() {
                    self.require(node, "aggregate argument", &call.arguments, &available);
                }
            }
            PlanNode::GroupId(group_id) => {
                let available = produced(&group_id.source);
                self.require(
                    node,
                    "grouping column",
                    group_id.grouping_columns.values(),
                    &available,
                );
                self.require(
                    node,
                    "aggregate argument",
                    &group_id.aggregation_arguments,
                    &available,
                );
            }
            PlanNode::DistinctLimit(distinct) => {
                let available = produced(&distinct.source);
                self.require(node, "distinct", &distinct.distinct_symbols, &available);
                self.require(node, "hash", &distinct.hash_symbol, &available);
            }
            PlanNode::MarkDistinct(mark) => {
                let available = produced(&mark.source);
                self.require(node, "distinct", &mark.distinct_symbols, &available);
                self.require(node, "hash", &mark.hash_symbol, &available);
            }
            PlanNode::RowNumber(row_number) => {
                let available = produced(&row_number.source);
                self.require(node, "partition", &row_number.partition_by, &available);
                self.require(node, "hash", &row_number.hash_symbol, &available);
            }
            PlanNode::TopNRowNumber(top_n) => {
                let available = produced(&top_n.source);
                let spec = &top_n.specification;
                self.require(node, "partition", &spec.partition_by, &available);
                self.require(node, "ordering", &ordering_symbols(&spec.ordering), &available);
                self.require(node, "hash", &top_n.hash_symbol, &available);
            }
            PlanNode::Window(window) => {
                let available = produced(&window.source);
                let spec = &window.specification;
                self.require(node, "partition", &spec.partition_by, &available);
                self.require(node, "ordering", &ordering_symbols(&spec.ordering), &available);
                self.require(node, "hash", &window.hash_symbol, &available);
                for function in window.functions.values() {
                    self.require(node, "window argument", &function.arguments, &available);
                }
            }
            PlanNode::Join(join) => {
                let left = produced(&join.left);
                let right = produced(&join.right);
                self.require(node, "left key", join.criteria.iter().map(|c| &c.left), &left);
                self.require(
                    node,
                    "right key",
                    join.criteria.iter().map(|c| &c.right),
                    &right,
                );
                self.require(node, "left hash", &join.left_hash_symbol, &left);
                self.require(node, "right hash", &join.right_hash_symbol, &right);
                let both: HashSet<Symbol> = left.union(&right).cloned().collect();
                self.require(node, "output", &join.output_symbols, &both);
                if let Some(filter) = &join.filter {
                    self.require(node, "filter", &filter.symbols(), &both);
                }
            }
            PlanNode::SemiJoin(semi) => {
                let source = produced(&semi.source);
                let filtering = produced(&semi.filtering_source);
                self.require(node, "source key", [&semi.source_join_symbol], &source);
                self.require(node, "source hash", &semi.source_hash_symbol, &source);
                self.require(
                    node,
                    "filtering key",
                    [&semi.filtering_source_join_symbol],
                    &filtering,
                );
                self.require(
                    node,
                    "filtering hash",
                    &semi.filtering_source_hash_symbol,
                    &filtering,
                );
            }
            PlanNode::SpatialJoin(spatial) => {
                let mut both = produced(&spatial.left);
                both.extend(spatial.right.output_symbols());
                self.require(node, "output", &spatial.output_symbols, &both);
                self.require(node, "filter", &spatial.filter.symbols(), &both);
            }
            PlanNode::IndexJoin(index_join) => {
                let probe = produced(&index_join.probe_source);
                let index = produced(&index_join.index_source);
                self.require(
                    node,
                    "probe key",
                    index_join.criteria.iter().map(|c| &c.probe),
                    &probe,
                );
                self.require(
                    node,
                    "index key",
                    index_join.criteria.iter().map(|c| &c.index),
                    &index,
                );
                self.require(node, "probe hash", &index_join.probe_hash_symbol, &probe);
                self.require(node, "index hash", &index_join.index_hash_symbol, &index);
            }
            PlanNode::Exchange(exchange) => {
                let scheme = &exchange.partitioning_scheme;
                if exchange.inputs.len() != exchange.sources.len() {
                    self.mismatch(
                        node,
                        format!(
                            "{} input lists for {} sources",
                            exchange.inputs.len(),
                            exchange.sources.len()
                        ),
                    );
                }
                for (i, (source, inputs)) in
                    exchange.sources.iter().zip(&exchange.inputs).enumerate()
                {
                    if inputs.len() != scheme.output_layout.len() {
                        self.mismatch(
                            node,
                            format!(
                                "source {i} feeds {} columns into a layout of {}",
                                inputs.len(),
                                scheme.output_layout.len()
                            ),
                        );
                    }
                    self.require(node, "input", inputs, &produced(source));
                }
                let layout: HashSet<Symbol> = scheme.output_layout.iter().cloned().collect();
                self.require(
                    node,
                    "partitioning",
                    scheme.partitioning.arguments.iter().filter_map(|a| a.column()),
                    &layout,
                );
                self.require(node, "hash column", &scheme.hash_column, &layout);
            }
            PlanNode::Union(union) => {
                for (output, inputs) in &union.symbol_mapping {
                    if inputs.len() != union.sources.len() {
                        self.mismatch(
                            node,
                            format!(
                                "output {output} maps {} inputs for {} sources",
                                inputs.len(),
                                union.sources.len()
                            ),
                        );
                    }
                }
                for (i, source) in union.sources.iter().enumerate() {
                    let available = produced(source);
                    let inputs: Vec<&Symbol> = union
                        .symbol_mapping
                        .values()
                        .filter_map(|inputs| inputs.get(i))
                        .collect();
                    self.require(node, "input", inputs, &available);
                }
            }
            PlanNode::Project(project) => {
                let available = produced(&project.source);
                for (_, expression) in project.assignments.iter() {
                    self.require(node, "assignment", &expression.symbols(), &available);
                }
            }
            PlanNode::Unnest(unnest) => {
                let available = produced(&unnest.source);
                self.require(node, "replicate", &unnest.replicate_symbols, &available);
                self.require(node, "unnest", unnest.unnest_symbols.keys(), &available);
            }
        }
    }
}

fn produced(node: &PlanNode) -> HashSet<Symbol> {
    node.output_symbols().into_iter().collect()
}

fn ordering_symbols(ordering: &Option<OrderingScheme>) -> Vec<Symbol> {
    ordering
        .as_ref()
        .map(OrderingScheme::symbols)
        .unwrap_or_default()
}

/// Validate symbol dependencies across `plan`.
///
/// All violations are reported together in one `PlanningError`.
pub fn validate_dependencies(plan: &PlanNode) -> StrataResult<()> {
    DependencyValidator::new().validate(plan).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        StrataError::planning(messages.join("; "))
    })
}

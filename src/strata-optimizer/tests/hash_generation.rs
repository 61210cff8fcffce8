//! End-to-end tests for the hash generation pass.
//!
//! Plans are built with `PlanBuilder`, optimized through the public pass and
//! inspected structurally.

use common_config::OptimizerConfig;
use indexmap::IndexMap;
use proptest::prelude::*;
use strata_optimizer::hash::{hash_expression, HashComputation};
use strata_optimizer::{HashGenerationOptimizer, Optimizer, OptimizerContext, PlanOptimizer};
use strata_plan::expr::{Assignments, ComparisonOp, Expression};
use strata_plan::ops::{
    EquiJoinClause, ExchangeType, IndexJoinClause, IndexJoinType, JoinType, Partitioning,
    PartitioningHandle, ProjectNode,
};
use strata_plan::{validate_dependencies, DataType, PlanBuilder, PlanNode, Symbol};

fn optimize_with(config: OptimizerConfig, builder: PlanBuilder, plan: PlanNode) -> PlanNode {
    let (symbols, ids) = builder.into_parts();
    let mut context = OptimizerContext::new(config, symbols, ids);
    HashGenerationOptimizer.optimize(plan, &mut context).unwrap()
}

fn optimize(builder: PlanBuilder, plan: PlanNode) -> PlanNode {
    optimize_with(OptimizerConfig::default(), builder, plan)
}

/// The projection directly below `node`'s only source, with the symbol it
/// assigns to `hash(keys)`.
fn hash_projection<'a>(source: &'a PlanNode, keys: &[Symbol]) -> (&'a ProjectNode, Symbol) {
    let PlanNode::Project(project) = source else {
        panic!("expected a hash projection, got {}", source.name());
    };
    let expected = hash_expression(keys).unwrap();
    let symbol = project
        .assignments
        .iter()
        .find(|(_, expression)| **expression == expected)
        .map(|(symbol, _)| symbol.clone())
        .unwrap_or_else(|| panic!("projection {} does not compute {expected}", project.id));
    (project, symbol)
}

#[test]
fn test_aggregation_materializes_grouping_hash() {
    let mut builder = PlanBuilder::new();
    let a = builder.symbol("a", DataType::Varchar);
    let b = builder.symbol("b", DataType::Varchar);
    let scan = builder.table_scan("t", vec![a.clone(), b.clone()]);
    let plan = builder.aggregation(scan, vec![a.clone(), b.clone()], IndexMap::new());

    let result = optimize(builder, plan);

    let PlanNode::Aggregation(aggregation) = &result else {
        panic!("expected the aggregation at the root");
    };
    let (project, hash) = hash_projection(&aggregation.source, &[a.clone(), b.clone()]);
    assert_eq!(aggregation.hash_symbol.as_ref(), Some(&hash));
    assert_eq!(project.assignments.outputs(), vec![a, b, hash.clone()]);
    assert_eq!(
        project.assignments.get(&hash).unwrap().to_string(),
        "combine_hash(combine_hash(BIGINT '0', COALESCE($operator$HASH_CODE(a), 0)), \
         COALESCE($operator$HASH_CODE(b), 0))"
    );
    assert!(matches!(*project.source, PlanNode::TableScan(_)));
    validate_dependencies(&result).unwrap();
}

#[test]
fn test_single_bigint_key_skips_hash() {
    let mut builder = PlanBuilder::new();
    let id = builder.symbol("id", DataType::BigInt);
    let name = builder.symbol("name", DataType::Varchar);
    let scan = builder.table_scan("t", vec![id.clone(), name.clone()]);
    let filter = builder.filter(
        scan,
        Expression::compare(ComparisonOp::Gt, Expression::symbol(&id), Expression::symbol(&id)),
    );
    let plan = builder.aggregation(filter, vec![id], IndexMap::new());

    let result = optimize(builder, plan.clone());
    assert_eq!(result, plan);
}

#[test]
fn test_streaming_aggregation_needs_no_hash() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let scan = builder.table_scan("t", vec![k.clone()]);
    let mut plan = builder.aggregation(scan, vec![k.clone()], IndexMap::new());
    if let PlanNode::Aggregation(aggregation) = &mut plan {
        aggregation.pre_grouped_symbols = vec![k];
    }

    let result = optimize(builder, plan.clone());
    assert_eq!(result, plan);
}

#[test]
fn test_join_hashes_both_sides() {
    let mut builder = PlanBuilder::new();
    let x = builder.symbol("x", DataType::Varchar);
    let y = builder.symbol("y", DataType::Varchar);
    let left = builder.table_scan("l", vec![x.clone()]);
    let right = builder.table_scan("r", vec![y.clone()]);
    let plan = builder.join(
        JoinType::Inner,
        left,
        right,
        vec![EquiJoinClause::new(x.clone(), y.clone())],
    );

    let result = optimize(builder, plan);

    let PlanNode::Join(join) = &result else {
        panic!("expected the join at the root");
    };
    let (_, left_hash) = hash_projection(&join.left, &[x.clone()]);
    let (_, right_hash) = hash_projection(&join.right, &[y.clone()]);
    assert_eq!(join.left_hash_symbol, Some(left_hash));
    assert_eq!(join.right_hash_symbol, Some(right_hash));
    // Nobody above asked for the key hashes.
    assert_eq!(join.output_symbols, vec![x, y]);
    assert_eq!(join.join_type, JoinType::Inner);
    validate_dependencies(&result).unwrap();
}

#[test]
fn test_outer_join_hides_null_extended_hashes() {
    let cases = [
        (JoinType::Inner, true),
        (JoinType::Left, true),
        (JoinType::Right, false),
        (JoinType::Full, false),
    ];

    for (join_type, reused) in cases {
        let mut builder = PlanBuilder::new();
        let x = builder.symbol("x", DataType::Varchar);
        let y = builder.symbol("y", DataType::Varchar);
        let left = builder.table_scan("l", vec![x.clone()]);
        let right = builder.table_scan("r", vec![y.clone()]);
        let join = builder.join(
            join_type,
            left,
            right,
            vec![EquiJoinClause::new(x.clone(), y.clone())],
        );
        let plan = builder.aggregation(join, vec![x.clone()], IndexMap::new());

        let result = optimize(builder, plan);
        validate_dependencies(&result).unwrap();

        let PlanNode::Aggregation(aggregation) = &result else {
            panic!("expected the aggregation at the root");
        };
        if reused {
            let PlanNode::Join(join) = aggregation.source.as_ref() else {
                panic!("{join_type:?}: expected the join directly below the aggregation");
            };
            assert_eq!(aggregation.hash_symbol, join.left_hash_symbol, "{join_type:?}");
            assert!(join
                .output_symbols
                .contains(join.left_hash_symbol.as_ref().unwrap()));
        } else {
            let (project, hash) = hash_projection(&aggregation.source, &[x.clone()]);
            let PlanNode::Join(join) = project.source.as_ref() else {
                panic!("{join_type:?}: expected the join below the hash projection");
            };
            assert_eq!(aggregation.hash_symbol, Some(hash), "{join_type:?}");
            assert_ne!(aggregation.hash_symbol, join.left_hash_symbol, "{join_type:?}");
            assert_eq!(join.output_symbols, vec![x.clone(), y.clone()], "{join_type:?}");
        }
    }
}

#[test]
fn test_cross_join_stays_plain() {
    let mut builder = PlanBuilder::new();
    let x = builder.symbol("x", DataType::Varchar);
    let y = builder.symbol("y", DataType::Varchar);
    let left = builder.table_scan("l", vec![x]);
    let right = builder.table_scan("r", vec![y]);
    let plan = builder.join(JoinType::Inner, left, right, vec![]);

    let result = optimize(builder, plan.clone());
    assert_eq!(result, plan);
}

#[test]
fn test_exchange_fan_in_agrees_on_hash_position() {
    let mut builder = PlanBuilder::new();
    let k1 = builder.symbol("k1", DataType::Varchar);
    let v1 = builder.symbol("v1", DataType::Double);
    let k2 = builder.symbol("k2", DataType::Varchar);
    let v2 = builder.symbol("v2", DataType::Double);
    let k = builder.symbol("k", DataType::Varchar);
    let v = builder.symbol("v", DataType::Double);
    let first = builder.table_scan("s1", vec![k1.clone(), v1.clone()]);
    let second = builder.table_scan("s2", vec![k2.clone(), v2.clone()]);
    let plan = builder.exchange(
        ExchangeType::Repartition,
        Partitioning::on_columns(PartitioningHandle::FixedHash, [k.clone()]),
        vec![k.clone(), v.clone()],
        vec![first, second],
    );

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::Exchange(exchange) = &result else {
        panic!("expected the exchange at the root");
    };
    let layout = &exchange.partitioning_scheme.output_layout;
    assert_eq!(layout.len(), 3);
    assert_eq!(layout[..2], [k, v]);
    assert_eq!(layout[2].name(), "$hashvalue");
    assert_eq!(exchange.partitioning_scheme.hash_column.as_ref(), Some(&layout[2]));

    for (i, source_key) in [k1, k2].iter().enumerate() {
        let (_, source_hash) = hash_projection(&exchange.sources[i], &[source_key.clone()]);
        assert_eq!(exchange.inputs[i].len(), 3);
        assert_eq!(exchange.inputs[i][2], source_hash);
    }
    assert_ne!(exchange.inputs[0][2], exchange.inputs[1][2]);
}

#[test]
fn test_gather_adds_no_hash_columns() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let scan = builder.table_scan("t", vec![k]);
    let plan = builder.gather(vec![scan]);

    let result = optimize(builder, plan.clone());
    assert_eq!(result, plan);
}

#[test]
fn test_union_maps_hash_through_every_source() {
    let mut builder = PlanBuilder::new();
    let k1 = builder.symbol("k1", DataType::Varchar);
    let k2 = builder.symbol("k2", DataType::Varchar);
    let k = builder.symbol("k", DataType::Varchar);
    let first = builder.table_scan("s1", vec![k1.clone()]);
    let second = builder.table_scan("s2", vec![k2.clone()]);
    let mut mapping = IndexMap::new();
    mapping.insert(k.clone(), vec![k1.clone(), k2.clone()]);
    let union = builder.union(vec![first, second], mapping);
    let plan = builder.aggregation(union, vec![k.clone()], IndexMap::new());

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::Aggregation(aggregation) = &result else {
        panic!("expected the aggregation at the root");
    };
    let PlanNode::Union(union) = aggregation.source.as_ref() else {
        panic!("expected the union directly below the aggregation");
    };
    let hash = aggregation.hash_symbol.clone().unwrap();
    let inputs = &union.symbol_mapping[&hash];
    assert_eq!(inputs.len(), 2);
    let (_, first_hash) = hash_projection(&union.sources[0], &[k1]);
    let (_, second_hash) = hash_projection(&union.sources[1], &[k2]);
    assert_eq!(inputs, &vec![first_hash, second_hash]);
}

#[test]
fn test_project_absorbs_preferred_hash() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let v = builder.symbol("v", DataType::Double);
    let scan = builder.table_scan("t", vec![k.clone(), v.clone()]);
    let project = builder.identity_project(scan, &[k.clone()]);
    let plan = builder.aggregation(project, vec![k.clone()], IndexMap::new());

    let result = optimize(builder, plan);

    let PlanNode::Aggregation(aggregation) = &result else {
        panic!("expected the aggregation at the root");
    };
    // The existing projection computes the hash; no second one is stacked on it.
    let (project, hash) = hash_projection(&aggregation.source, &[k.clone()]);
    assert_eq!(aggregation.hash_symbol, Some(hash));
    assert!(matches!(*project.source, PlanNode::TableScan(_)));
}

#[test]
fn test_filter_passes_hash_through() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let scan = builder.table_scan("t", vec![k.clone()]);
    let project = builder.identity_project(scan, &[k.clone()]);
    let filter = builder.filter(
        project,
        Expression::compare(ComparisonOp::NotEq, Expression::symbol(&k), Expression::symbol(&k)),
    );
    let plan = builder.aggregation(filter, vec![k.clone()], IndexMap::new());

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::Aggregation(aggregation) = &result else {
        panic!("expected the aggregation at the root");
    };
    let PlanNode::Filter(filter) = aggregation.source.as_ref() else {
        panic!("expected the filter directly below the aggregation");
    };
    let (_, hash) = hash_projection(&filter.source, &[k]);
    assert_eq!(aggregation.hash_symbol, Some(hash));
}

#[test]
fn test_semi_join_hashes_both_inputs() {
    let mut builder = PlanBuilder::new();
    let a = builder.symbol("a", DataType::Varchar);
    let b = builder.symbol("b", DataType::Varchar);
    let source = builder.table_scan("s", vec![a.clone()]);
    let filtering = builder.table_scan("f", vec![b.clone()]);
    let plan = builder.semi_join(source, filtering, a.clone(), b.clone());

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::SemiJoin(semi) = &result else {
        panic!("expected the semi-join at the root");
    };
    let (_, source_hash) = hash_projection(&semi.source, &[a]);
    let (_, filtering_hash) = hash_projection(&semi.filtering_source, &[b]);
    assert_eq!(semi.source_hash_symbol, Some(source_hash));
    assert_eq!(semi.filtering_source_hash_symbol, Some(filtering_hash));
}

#[test]
fn test_index_join_source_outer_drops_probe_hashes() {
    let cases = [
        (IndexJoinType::Inner, true),
        (IndexJoinType::SourceOuter, false),
    ];
    for (join_type, probe_visible) in cases {
        let mut builder = PlanBuilder::new();
        let p = builder.symbol("p", DataType::Varchar);
        let i = builder.symbol("i", DataType::Varchar);
        let probe = builder.table_scan("probe", vec![p.clone()]);
        let index = builder.table_scan("index", vec![i.clone()]);
        let join = builder.index_join(
            join_type,
            probe,
            index,
            vec![IndexJoinClause::new(p.clone(), i.clone())],
        );
        let plan = builder.aggregation(join, vec![p.clone()], IndexMap::new());

        let result = optimize(builder, plan);
        validate_dependencies(&result).unwrap();

        let PlanNode::Aggregation(aggregation) = &result else {
            panic!("expected the aggregation at the root");
        };
        let reused = matches!(aggregation.source.as_ref(), PlanNode::IndexJoin(join)
            if join.probe_hash_symbol == aggregation.hash_symbol);
        assert_eq!(reused, probe_visible, "{join_type:?}");
    }
}

#[test]
fn test_spatial_join_keeps_children_plain() {
    let mut builder = PlanBuilder::new();
    let a = builder.symbol("a", DataType::Varchar);
    let b = builder.symbol("b", DataType::Varchar);
    let left = builder.table_scan("l", vec![a.clone()]);
    let right = builder.table_scan("r", vec![b.clone()]);
    let predicate = Expression::call(
        "st_contains",
        vec![Expression::symbol(&a), Expression::symbol(&b)],
    );
    let plan = builder.spatial_join(left, right, predicate);

    let result = optimize(builder, plan.clone());
    assert_eq!(result, plan);
}

#[test]
fn test_row_number_exposes_only_its_partition_hash() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let j = builder.symbol("j", DataType::Varchar);
    let scan = builder.table_scan("t", vec![k.clone(), j.clone()]);
    let project = builder.identity_project(scan, &[k.clone(), j.clone()]);
    let row_number = builder.row_number(project, vec![k.clone()]);
    let plan = builder.aggregation(row_number, vec![j.clone()], IndexMap::new());

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::Aggregation(aggregation) = &result else {
        panic!("expected the aggregation at the root");
    };
    // hash(j) was preferred through the row number and computed below it,
    // but only hash(k) is exposed, so the aggregation gets its own projection.
    let (project, hash) = hash_projection(&aggregation.source, &[j]);
    assert_eq!(aggregation.hash_symbol, Some(hash));
    let PlanNode::RowNumber(row_number) = project.source.as_ref() else {
        panic!("expected the row number below the projection");
    };
    let (_, partition_hash) = hash_projection(&row_number.source, &[k]);
    assert_eq!(row_number.hash_symbol, Some(partition_hash));
}

#[test]
fn test_window_and_mark_distinct_set_hash_symbols() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let scan = builder.table_scan("t", vec![k.clone()]);
    let window = builder.window(scan, vec![k.clone()]);
    let plan = builder.mark_distinct(window, vec![k.clone()]);

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::MarkDistinct(mark) = &result else {
        panic!("expected the mark distinct at the root");
    };
    let PlanNode::Window(window) = mark.source.as_ref() else {
        panic!("expected the window to offer the shared hash directly");
    };
    assert!(window.hash_symbol.is_some());
    assert_eq!(mark.hash_symbol, window.hash_symbol);
}

#[test]
fn test_unpartitioned_window_is_plain() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let scan = builder.table_scan("t", vec![k]);
    let plan = builder.window(scan, vec![]);

    let result = optimize(builder, plan.clone());
    assert_eq!(result, plan);
}

#[test]
fn test_unnest_replicates_preferred_hash() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let arr = builder.symbol("arr", DataType::Varchar);
    let element = builder.symbol("element", DataType::Varchar);
    let scan = builder.table_scan("t", vec![k.clone(), arr.clone()]);
    let project = builder.identity_project(scan, &[k.clone(), arr.clone()]);
    let mut unnest_symbols = IndexMap::new();
    unnest_symbols.insert(arr, vec![element]);
    let unnest = builder.unnest(project, vec![k.clone()], unnest_symbols);
    let plan = builder.aggregation(unnest, vec![k.clone()], IndexMap::new());

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::Aggregation(aggregation) = &result else {
        panic!("expected the aggregation at the root");
    };
    let PlanNode::Unnest(unnest) = aggregation.source.as_ref() else {
        panic!("expected the unnest directly below the aggregation");
    };
    let hash = aggregation.hash_symbol.clone().unwrap();
    assert_eq!(unnest.replicate_symbols, vec![k, hash]);
}

#[test]
fn test_apply_is_left_alone() {
    let mut builder = PlanBuilder::new();
    let a = builder.symbol("a", DataType::Varchar);
    let b = builder.symbol("b", DataType::Varchar);
    let input = builder.table_scan("i", vec![a.clone()]);
    let inner = builder.table_scan("s", vec![b.clone()]);
    let subquery = builder.aggregation(inner, vec![b.clone()], IndexMap::new());
    let plan = builder.apply(input, subquery, Assignments::identity([&b]), vec![a]);

    let result = optimize(builder, plan.clone());
    assert_eq!(result, plan);
}

#[test]
fn test_skip_rule_aggregation_keeps_hashes_out_of_its_subtree() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::BigInt);
    let v = builder.symbol("v", DataType::Varchar);
    let scan = builder.table_scan("t", vec![k.clone(), v.clone()]);
    let project = builder.identity_project(scan, &[k.clone(), v.clone()]);
    let aggregation = builder.aggregation(project.clone(), vec![k.clone()], IndexMap::new());
    let plan = builder.repartition(aggregation, vec![k.clone()]);

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::Exchange(exchange) = &result else {
        panic!("expected the exchange at the root");
    };
    let (enforced, _) = hash_projection(&exchange.sources[0], &[k.clone()]);
    let PlanNode::Aggregation(aggregation) = enforced.source.as_ref() else {
        panic!("expected the aggregation below the partition hash projection");
    };
    assert_eq!(aggregation.hash_symbol, None);
    assert_eq!(*aggregation.source, project);

    let expected = hash_expression(&[k]).unwrap();
    let computing = result.find_all(|node| {
        matches!(node, PlanNode::Project(project)
            if project.assignments.iter().any(|(_, expression)| *expression == expected))
    });
    assert_eq!(computing.len(), 1);
}

#[test]
fn test_top_n_row_number_exposes_only_its_partition_hash() {
    for partial in [false, true] {
        let mut builder = PlanBuilder::new();
        let k = builder.symbol("k", DataType::Varchar);
        let j = builder.symbol("j", DataType::Varchar);
        let scan = builder.table_scan("t", vec![k.clone(), j.clone()]);
        let project = builder.identity_project(scan, &[k.clone(), j.clone()]);
        let mut top_n = builder.top_n_row_number(project, vec![k.clone()], vec![j.clone()], 3);
        if let PlanNode::TopNRowNumber(node) = &mut top_n {
            node.partial = partial;
        }
        let plan = builder.repartition(top_n, vec![j.clone()]);

        let result = optimize(builder, plan);
        validate_dependencies(&result).unwrap();

        let PlanNode::Exchange(exchange) = &result else {
            panic!("expected the exchange at the root");
        };
        // hash(j) reaches the projection below, but the operator only
        // vouches for hash(k), so the exchange computes hash(j) again.
        let (enforced, _) = hash_projection(&exchange.sources[0], &[j.clone()]);
        let PlanNode::TopNRowNumber(top_n) = enforced.source.as_ref() else {
            panic!("partial={partial}: expected the top-n row number below the projection");
        };
        let (_, partition_hash) = hash_projection(&top_n.source, &[k.clone()]);
        assert_eq!(top_n.hash_symbol.as_ref(), Some(&partition_hash), "partial={partial}");
        assert!(!enforced.assignments.outputs().contains(&partition_hash));
        assert_eq!(
            top_n.output_symbols().contains(&top_n.row_number_symbol),
            !partial
        );
    }
}

#[test]
fn test_group_id_prunes_preference_to_source_columns() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let v = builder.symbol("v", DataType::Double);
    let w = builder.symbol("w", DataType::Double);
    let scan = builder.table_scan("t", vec![k.clone(), v.clone(), w.clone()]);
    let project = builder.identity_project(scan, &[k.clone(), v.clone(), w.clone()]);
    let group_id = builder.group_id(project.clone(), vec![vec![k.clone()], vec![]], vec![v]);
    let group_id_symbol = group_id.output_symbols().last().cloned().unwrap();
    let plan = builder.repartition(group_id, vec![k.clone(), group_id_symbol.clone()]);

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::Exchange(exchange) = &result else {
        panic!("expected the exchange at the root");
    };
    let (enforced, _) = hash_projection(&exchange.sources[0], &[k, group_id_symbol]);
    let PlanNode::GroupId(group_id) = enforced.source.as_ref() else {
        panic!("expected the group id below the partition hash projection");
    };
    assert_eq!(*group_id.source, project);
}

#[test]
fn test_enforce_single_row_passes_no_preference() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let scan = builder.table_scan("t", vec![k.clone()]);
    let project = builder.identity_project(scan, &[k.clone()]);
    let single = builder.enforce_single_row(project.clone());
    let plan = builder.repartition(single, vec![k.clone()]);

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::Exchange(exchange) = &result else {
        panic!("expected the exchange at the root");
    };
    let (enforced, _) = hash_projection(&exchange.sources[0], &[k]);
    let PlanNode::EnforceSingleRow(single) = enforced.source.as_ref() else {
        panic!("expected the single row check below the projection");
    };
    assert_eq!(*single.source, project);
}

#[test]
fn test_lateral_join_is_left_alone() {
    let mut builder = PlanBuilder::new();
    let a = builder.symbol("a", DataType::Varchar);
    let b = builder.symbol("b", DataType::Varchar);
    let input = builder.table_scan("i", vec![a.clone()]);
    let inner = builder.table_scan("s", vec![b.clone()]);
    let subquery = builder.aggregation(inner, vec![b], IndexMap::new());
    let lateral = builder.lateral_join(input, subquery, vec![a.clone()]);
    let plan = builder.repartition(lateral.clone(), vec![a.clone()]);

    let result = optimize(builder, plan);

    let PlanNode::Exchange(exchange) = &result else {
        panic!("expected the exchange at the root");
    };
    let (enforced, _) = hash_projection(&exchange.sources[0], &[a]);
    assert_eq!(*enforced.source, lateral);
}

#[test]
fn test_distinct_limit_drops_other_child_hashes() {
    let mut builder = PlanBuilder::new();
    let k = builder.symbol("k", DataType::Varchar);
    let j = builder.symbol("j", DataType::Varchar);
    let scan = builder.table_scan("t", vec![k.clone(), j.clone()]);
    let project = builder.identity_project(scan, &[k.clone(), j.clone()]);
    let distinct = builder.distinct_limit(project, vec![k.clone(), j.clone()], 10);
    let plan = builder.repartition(distinct, vec![j.clone()]);

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::Exchange(exchange) = &result else {
        panic!("expected the exchange at the root");
    };
    let (enforced, _) = hash_projection(&exchange.sources[0], &[j.clone()]);
    let PlanNode::DistinctLimit(distinct) = enforced.source.as_ref() else {
        panic!("expected the distinct limit below the projection");
    };
    let (below, distinct_hash) = hash_projection(&distinct.source, &[k, j.clone()]);
    assert_eq!(distinct.hash_symbol, Some(distinct_hash.clone()));
    // hash(j) was computed below as well, yet only the distinct hash is
    // offered upward, and the projection above narrows to the new hash.
    let (_, unused) = hash_projection(&distinct.source, &[j]);
    assert!(below.assignments.outputs().contains(&unused));
    assert!(!distinct.output_symbols().contains(&unused));
    assert!(!enforced.assignments.outputs().contains(&distinct_hash));
}

#[test]
fn test_exchange_fan_in_with_two_hash_columns() {
    let mut builder = PlanBuilder::new();
    let k1 = builder.symbol("k1", DataType::Varchar);
    let v1 = builder.symbol("v1", DataType::Varchar);
    let k2 = builder.symbol("k2", DataType::Varchar);
    let v2 = builder.symbol("v2", DataType::Varchar);
    let k = builder.symbol("k", DataType::Varchar);
    let v = builder.symbol("v", DataType::Varchar);
    let first = builder.table_scan("s1", vec![k1.clone(), v1.clone()]);
    let second = builder.table_scan("s2", vec![k2.clone(), v2.clone()]);
    let exchange = builder.exchange(
        ExchangeType::Repartition,
        Partitioning::on_columns(PartitioningHandle::FixedHash, [k.clone()]),
        vec![k.clone(), v.clone()],
        vec![first, second],
    );
    let plan = builder.aggregation(exchange, vec![k.clone(), v.clone()], IndexMap::new());

    let result = optimize(builder, plan);
    validate_dependencies(&result).unwrap();

    let PlanNode::Aggregation(aggregation) = &result else {
        panic!("expected the aggregation at the root");
    };
    let PlanNode::Exchange(exchange) = aggregation.source.as_ref() else {
        panic!("expected the exchange to offer the grouping hash directly");
    };
    let layout = &exchange.partitioning_scheme.output_layout;
    assert_eq!(layout.len(), 4);
    assert_eq!(layout[..2], [k, v]);
    let position = |symbol: &Symbol| layout.iter().position(|s| s == symbol).unwrap();
    let group_position = position(aggregation.hash_symbol.as_ref().unwrap());
    let partition_position = position(exchange.partitioning_scheme.hash_column.as_ref().unwrap());
    assert_ne!(group_position, partition_position);
    assert!(group_position >= 2 && partition_position >= 2);

    for (i, (source_k, source_v)) in [(k1, v1), (k2, v2)].into_iter().enumerate() {
        let keys = [source_k.clone(), source_v];
        let (_, group_hash) = hash_projection(&exchange.sources[i], &keys);
        let (_, partition_hash) = hash_projection(&exchange.sources[i], &[source_k]);
        assert_eq!(exchange.inputs[i].len(), 4);
        assert_eq!(exchange.inputs[i][group_position], group_hash);
        assert_eq!(exchange.inputs[i][partition_position], partition_hash);
    }
}

#[test]
fn test_disabled_pass_returns_plan_unchanged() {
    let mut builder = PlanBuilder::new();
    let a = builder.symbol("a", DataType::Varchar);
    let scan = builder.table_scan("t", vec![a.clone()]);
    let plan = builder.aggregation(scan, vec![a], IndexMap::new());

    let config = OptimizerConfig::default().with_hash_generation(false);
    let result = optimize_with(config, builder, plan.clone());
    assert_eq!(result, plan);
}

#[test]
fn test_depth_limit_is_a_planning_error() {
    let mut builder = PlanBuilder::new();
    let a = builder.symbol("a", DataType::Varchar);
    let mut plan = builder.table_scan("t", vec![a]);
    for _ in 0..10 {
        plan = builder.limit(plan, 1);
    }

    let (symbols, ids) = builder.into_parts();
    let config = OptimizerConfig::default().with_max_plan_depth(5);
    let mut context = OptimizerContext::new(config, symbols, ids);
    let err = HashGenerationOptimizer.optimize(plan, &mut context).unwrap_err();
    assert!(err.to_string().starts_with("PlanningError"));
}

#[test]
fn test_default_optimizer_runs_hash_generation() {
    let mut builder = PlanBuilder::new();
    let a = builder.symbol("a", DataType::Varchar);
    let scan = builder.table_scan("t", vec![a.clone()]);
    let plan = builder.aggregation(scan, vec![a], IndexMap::new());
    let (symbols, ids) = builder.into_parts();
    let config = OptimizerConfig::default().with_trace(true);
    let mut context = OptimizerContext::new(config, symbols, ids);

    let optimized = Optimizer::default().optimize(plan, &mut context).unwrap();
    assert_eq!(optimized.passes_applied, 1);
    assert_eq!(optimized.trace.len(), 1);
    assert!(optimized.trace[0].after.contains("Project"));
}

/// One step of a randomly grown single-chain plan.
#[derive(Debug, Clone, Copy)]
enum Step {
    Filter,
    Limit,
    Aggregate(usize),
    Repartition(usize),
    RowNumber(usize),
    MarkDistinct(usize),
    DistinctLimit(usize),
    Window(usize),
    Project,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Filter),
        Just(Step::Limit),
        (0usize..8).prop_map(Step::Aggregate),
        (0usize..8).prop_map(Step::Repartition),
        (0usize..8).prop_map(Step::RowNumber),
        (0usize..8).prop_map(Step::MarkDistinct),
        (0usize..8).prop_map(Step::DistinctLimit),
        (0usize..8).prop_map(Step::Window),
        Just(Step::Project),
    ]
}

/// Key subset of `columns` picked by the bits of `mask`; never empty.
fn pick(columns: &[Symbol], mask: usize) -> Vec<Symbol> {
    let keys: Vec<Symbol> = columns
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, symbol)| symbol.clone())
        .collect();
    if keys.is_empty() {
        vec![columns[mask % columns.len()].clone()]
    } else {
        keys
    }
}

fn build_chain(steps: &[Step]) -> (PlanBuilder, PlanNode) {
    let mut builder = PlanBuilder::new();
    let columns = vec![
        builder.symbol("id", DataType::BigInt),
        builder.symbol("name", DataType::Varchar),
        builder.symbol("city", DataType::Varchar),
    ];
    let mut plan = builder.table_scan("people", columns.clone());

    for step in steps {
        let visible: Vec<Symbol> = plan
            .output_symbols()
            .into_iter()
            .filter(|symbol| columns.contains(symbol))
            .collect();
        if visible.is_empty() {
            break;
        }
        plan = match *step {
            Step::Filter => {
                let column = Expression::symbol(&visible[0]);
                builder.filter(plan, Expression::compare(ComparisonOp::Eq, column.clone(), column))
            }
            Step::Limit => builder.limit(plan, 100),
            Step::Aggregate(mask) => builder.aggregation(plan, pick(&visible, mask), IndexMap::new()),
            Step::Repartition(mask) => builder.repartition(plan, pick(&visible, mask)),
            Step::RowNumber(mask) => builder.row_number(plan, pick(&visible, mask)),
            Step::MarkDistinct(mask) => builder.mark_distinct(plan, pick(&visible, mask)),
            Step::DistinctLimit(mask) => builder.distinct_limit(plan, pick(&visible, mask), 10),
            Step::Window(mask) => builder.window(plan, pick(&visible, mask)),
            Step::Project => builder.identity_project(plan, &visible),
        };
    }
    (builder, plan)
}

proptest! {
    #[test]
    fn test_rewrite_is_deterministic(steps in prop::collection::vec(arb_step(), 1..8)) {
        let (builder, plan) = build_chain(&steps);
        let first = optimize(builder.clone(), plan.clone());
        let second = optimize(builder, plan);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_rewritten_plans_are_well_formed(steps in prop::collection::vec(arb_step(), 1..8)) {
        let (builder, plan) = build_chain(&steps);
        let operators = plan.operator_count();
        let result = optimize(builder, plan);

        prop_assert!(validate_dependencies(&result).is_ok(), "{}", result.explain());
        prop_assert!(result.operator_count() >= operators);

        // Every hash consumer reads a column that hashes exactly its keys.
        for node in result.find_all(|node| matches!(node, PlanNode::Aggregation(_))) {
            let PlanNode::Aggregation(aggregation) = node else { unreachable!() };
            if let Some(hash) = &aggregation.hash_symbol {
                let keys = HashComputation::new(aggregation.grouping_keys.clone()).unwrap();
                prop_assert!(computes(&aggregation.source, hash, &keys.to_expression()));
            }
        }
    }
}

/// Whether `symbol` in `node`'s output carries `expression`, following
/// identity projections and pass-through operators.
fn computes(node: &PlanNode, symbol: &Symbol, expression: &Expression) -> bool {
    match node {
        PlanNode::Project(project) => match project.assignments.get(symbol) {
            Some(assigned) if assigned == expression => true,
            Some(Expression::SymbolRef(input)) => computes(&project.source, input, expression),
            _ => false,
        },
        PlanNode::Exchange(exchange) => {
            let Some(position) = exchange
                .partitioning_scheme
                .output_layout
                .iter()
                .position(|output| output == symbol)
            else {
                return false;
            };
            exchange.sources.iter().zip(&exchange.inputs).all(|(source, inputs)| {
                // Key names match across a repartition built from a single source.
                computes(source, &inputs[position], expression)
            })
        }
        PlanNode::Aggregation(aggregation) if aggregation.hash_symbol.as_ref() == Some(symbol) => {
            let keys = HashComputation::new(aggregation.grouping_keys.clone()).unwrap();
            keys.to_expression() == *expression
        }
        _ => node.sources().into_iter().any(|source| {
            source.output_symbols().contains(symbol) && computes(source, symbol, expression)
        }),
    }
}

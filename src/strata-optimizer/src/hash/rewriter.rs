//! Bottom-up hash propagation over a plan tree.
//!
//! Each call threads the hashes the parent would like available downward and
//! returns the rewritten node with the hashes it actually offers. Operators
//! that need a hash require it from their child, and [`HashRewriter::enforce`]
//! inserts a projection whenever the child cannot supply it as is.

use std::collections::HashSet;

use common_error::{ensure, StrataError, StrataResult};
use log::trace;
use strata_plan::expr::{Assignments, Expression};
use strata_plan::ops::{
    AggregationNode, DistinctLimitNode, ExchangeNode, IndexJoinNode, IndexJoinType, JoinNode,
    JoinType, MarkDistinctNode, ProjectNode, RowNumberNode, SemiJoinNode, SpatialJoinNode,
    TopNRowNumberNode, UnionNode, UnnestNode, WindowNode,
};
use strata_plan::{DataType, PlanNode, PlanNodeIdAllocator, Symbol, SymbolAllocator, TypeProvider};

use super::{
    compute_hash, HashComputation, HashComputationSet, HashSymbolMap, PlanWithProperties,
};

/// Recursive hash rewriter for one pass invocation.
pub(crate) struct HashRewriter<'a> {
    types: &'a TypeProvider,
    symbols: &'a mut SymbolAllocator,
    ids: &'a mut PlanNodeIdAllocator,
    max_depth: usize,
    depth: usize,
}

impl<'a> HashRewriter<'a> {
    pub(crate) fn new(
        types: &'a TypeProvider,
        symbols: &'a mut SymbolAllocator,
        ids: &'a mut PlanNodeIdAllocator,
        max_depth: usize,
    ) -> Self {
        Self {
            types,
            symbols,
            ids,
            max_depth,
            depth: 0,
        }
    }

    /// Rewrite `node` given the parent's preference, then check that every
    /// offered hash symbol is an output of the rewritten node.
    pub(crate) fn plan(
        &mut self,
        node: PlanNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        if self.depth >= self.max_depth {
            return Err(StrataError::planning(format!(
                "plan is deeper than the maximum of {} operators",
                self.max_depth
            )));
        }

        self.depth += 1;
        let result = self.visit(node, preference);
        self.depth -= 1;
        let result = result?;

        let outputs: HashSet<Symbol> = result.node().output_symbols().into_iter().collect();
        ensure!(
            result.hash_symbols().values().all(|symbol| outputs.contains(symbol)),
            InternalError: "Node {} declares hash symbols not in the output", result.node().name()
        );
        Ok(result)
    }

    fn visit(
        &mut self,
        node: PlanNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        match node {
            PlanNode::TableScan(_) | PlanNode::Values(_) => {
                Ok(PlanWithProperties::without_hashes(node))
            }
            PlanNode::Filter(_)
            | PlanNode::Limit(_)
            | PlanNode::Sort(_)
            | PlanNode::TopN(_)
            | PlanNode::Output(_) => self.plan_simple(node, preference),
            // A single row needs no precomputed hashes.
            PlanNode::EnforceSingleRow(_) => self.plan_simple(node, &HashComputationSet::new()),
            // Not executable; left for a later check to reject.
            PlanNode::Apply(_) | PlanNode::LateralJoin(_) => {
                Ok(PlanWithProperties::without_hashes(node))
            }
            PlanNode::Aggregation(aggregation) => self.plan_aggregation(aggregation),
            PlanNode::GroupId(ref group_id) => {
                let preference = preference.prune_symbols(&group_id.source.output_symbols());
                self.plan_simple(node, &preference)
            }
            PlanNode::DistinctLimit(distinct) => self.plan_distinct_limit(distinct, preference),
            PlanNode::MarkDistinct(mark) => self.plan_mark_distinct(mark, preference),
            PlanNode::RowNumber(row_number) => self.plan_row_number(row_number, preference),
            PlanNode::TopNRowNumber(top_n) => self.plan_top_n_row_number(top_n, preference),
            PlanNode::Window(window) => self.plan_window(window, preference),
            PlanNode::Join(join) => self.plan_join(join, preference),
            PlanNode::SemiJoin(semi) => self.plan_semi_join(semi),
            PlanNode::SpatialJoin(spatial) => self.plan_spatial_join(spatial),
            PlanNode::IndexJoin(index_join) => self.plan_index_join(index_join),
            PlanNode::Exchange(exchange) => self.plan_exchange(exchange, preference),
            PlanNode::Union(union) => self.plan_union(union, preference),
            PlanNode::Project(project) => self.plan_project(project, preference),
            PlanNode::Unnest(unnest) => self.plan_unnest(unnest, preference),
        }
    }

    /// Single-source operator that needs no hash of its own.
    fn plan_simple(
        &mut self,
        node: PlanNode,
        preferred: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        if node.is_leaf() {
            return Ok(PlanWithProperties::without_hashes(node));
        }
        ensure!(
            node.sources().len() == 1,
            InternalError: "{} is not a single-source operator", node.name()
        );

        let required = HashComputationSet::new();
        let mut source_hashes = HashSymbolMap::new();
        let node = node.map_sources(|source| {
            let (source, hashes) = self
                .plan_and_enforce(source, &required, true, preferred)?
                .into_parts();
            source_hashes = hashes;
            Ok(source)
        })?;

        let outputs: HashSet<Symbol> = node.output_symbols().into_iter().collect();
        source_hashes.retain(|_, symbol| outputs.contains(symbol));
        Ok(PlanWithProperties::new(node, source_hashes))
    }

    fn plan_aggregation(&mut self, mut node: AggregationNode) -> StrataResult<PlanWithProperties> {
        // Ancestor preferences are not forwarded through a grouping.
        if node.is_streamable() || self.can_skip_hash_generation(&node.grouping_keys) {
            let none = HashComputationSet::new();
            let child = self.plan_and_enforce(*node.source, &none, false, &none)?;
            node.source = Box::new(child.into_node());
            return Ok(PlanWithProperties::without_hashes(PlanNode::Aggregation(node)));
        }

        let hash = required_hash(&node.grouping_keys)?;
        let required = HashComputationSet::from(hash.clone());
        let child = self.plan_and_enforce(*node.source, &required, false, &required)?;
        let hash_symbol = child.required_hash_symbol(&hash)?;

        let mut hashes = HashSymbolMap::new();
        hashes.insert(hash, hash_symbol.clone())?;
        node.source = Box::new(child.into_node());
        node.hash_symbol = Some(hash_symbol);
        Ok(PlanWithProperties::new(PlanNode::Aggregation(node), hashes))
    }

    fn plan_distinct_limit(
        &mut self,
        mut node: DistinctLimitNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        if self.can_skip_hash_generation(&node.distinct_symbols) {
            return self.plan_simple(PlanNode::DistinctLimit(node), preference);
        }

        let hash = required_hash(&node.distinct_symbols)?;
        let preferred =
            preference.with_hash_computation_for(&node.output_symbols(), Some(hash.clone()));
        let child = self.plan_and_enforce(*node.source, &hash.clone().into(), false, &preferred)?;
        let hash_symbol = child.required_hash_symbol(&hash)?;

        // Other hashes offered by the child are dropped here even when they
        // would survive the distinct.
        let mut hashes = HashSymbolMap::new();
        hashes.insert(hash, hash_symbol.clone())?;
        node.source = Box::new(child.into_node());
        node.hash_symbol = Some(hash_symbol);
        Ok(PlanWithProperties::new(PlanNode::DistinctLimit(node), hashes))
    }

    fn plan_mark_distinct(
        &mut self,
        mut node: MarkDistinctNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        if self.can_skip_hash_generation(&node.distinct_symbols) {
            return self.plan_simple(PlanNode::MarkDistinct(node), preference);
        }

        let hash = required_hash(&node.distinct_symbols)?;
        let preferred =
            preference.with_hash_computation_for(&node.output_symbols(), Some(hash.clone()));
        let child = self.plan_and_enforce(*node.source, &hash.clone().into(), false, &preferred)?;
        let hash_symbol = child.required_hash_symbol(&hash)?;

        let (child, hashes) = child.into_parts();
        node.source = Box::new(child);
        node.hash_symbol = Some(hash_symbol);
        Ok(PlanWithProperties::new(PlanNode::MarkDistinct(node), hashes))
    }

    fn plan_row_number(
        &mut self,
        mut node: RowNumberNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        if self.can_skip_hash_generation(&node.partition_by) {
            return self.plan_simple(PlanNode::RowNumber(node), preference);
        }

        let hash = required_hash(&node.partition_by)?;
        let preferred =
            preference.with_hash_computation_for(&node.output_symbols(), Some(hash.clone()));
        let child = self.plan_and_enforce(*node.source, &hash.clone().into(), false, &preferred)?;
        let hash_symbol = child.required_hash_symbol(&hash)?;

        let mut hashes = HashSymbolMap::new();
        hashes.insert(hash, hash_symbol.clone())?;
        node.source = Box::new(child.into_node());
        node.hash_symbol = Some(hash_symbol);
        Ok(PlanWithProperties::new(PlanNode::RowNumber(node), hashes))
    }

    fn plan_top_n_row_number(
        &mut self,
        mut node: TopNRowNumberNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        if self.can_skip_hash_generation(&node.specification.partition_by) {
            return self.plan_simple(PlanNode::TopNRowNumber(node), preference);
        }

        let hash = required_hash(&node.specification.partition_by)?;
        let preferred =
            preference.with_hash_computation_for(&node.output_symbols(), Some(hash.clone()));
        let child = self.plan_and_enforce(*node.source, &hash.clone().into(), false, &preferred)?;
        let hash_symbol = child.required_hash_symbol(&hash)?;

        let mut hashes = HashSymbolMap::new();
        hashes.insert(hash, hash_symbol.clone())?;
        node.source = Box::new(child.into_node());
        node.hash_symbol = Some(hash_symbol);
        Ok(PlanWithProperties::new(PlanNode::TopNRowNumber(node), hashes))
    }

    fn plan_window(
        &mut self,
        mut node: WindowNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        if node.specification.partition_by.is_empty() {
            return self.plan_simple(PlanNode::Window(node), preference);
        }

        let hash = required_hash(&node.specification.partition_by)?;
        let preferred =
            preference.with_hash_computation_for(&node.output_symbols(), Some(hash.clone()));
        let child = self.plan_and_enforce(*node.source, &hash.clone().into(), true, &preferred)?;
        let hash_symbol = child.required_hash_symbol(&hash)?;

        let (child, hashes) = child.into_parts();
        node.source = Box::new(child);
        node.hash_symbol = Some(hash_symbol);
        Ok(PlanWithProperties::new(PlanNode::Window(node), hashes))
    }

    fn plan_join(
        &mut self,
        mut node: JoinNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        let none = HashComputationSet::new();

        if node.criteria.is_empty() {
            let left = self.plan_and_enforce(*node.left, &none, true, &none)?;
            let right = self.plan_and_enforce(*node.right, &none, true, &none)?;
            ensure!(
                left.hash_symbols().is_empty() && right.hash_symbols().is_empty(),
                InternalError: "Join {} without criteria offers hash symbols", node.id
            );
            node.left = Box::new(left.into_node());
            node.right = Box::new(right.into_node());
            return Ok(PlanWithProperties::without_hashes(PlanNode::Join(node)));
        }

        // Both sides get their key hash regardless of what the parent wants,
        // and nothing else is passed down.
        let left_keys: Vec<Symbol> = node.criteria.iter().map(|c| c.left.clone()).collect();
        let left_hash = required_hash(&left_keys)?;
        let left_required = HashComputationSet::from(left_hash.clone());
        let left = self.plan_and_enforce(*node.left, &left_required, true, &left_required)?;
        let left_hash_symbol = left.required_hash_symbol(&left_hash)?;

        let right_keys: Vec<Symbol> = node.criteria.iter().map(|c| c.right.clone()).collect();
        let right_hash = required_hash(&right_keys)?;
        let right_required = HashComputationSet::from(right_hash.clone());
        let right = self.plan_and_enforce(*node.right, &right_required, true, &right_required)?;
        let right_hash_symbol = right.required_hash_symbol(&right_hash)?;

        // The null-extended side of an outer join cannot vouch for its hashes.
        let mut hashes = HashSymbolMap::new();
        if matches!(node.join_type, JoinType::Inner | JoinType::Left) {
            hashes.extend_from(left.hash_symbols())?;
        }
        if matches!(node.join_type, JoinType::Inner | JoinType::Right) {
            hashes.extend_from(right.hash_symbols())?;
        }
        hashes.retain(|hash, _| preference.contains(hash));

        let left = left.into_node();
        let right = right.into_node();
        let declared: HashSet<&Symbol> = node.output_symbols.iter().collect();
        node.output_symbols = left
            .output_symbols()
            .into_iter()
            .chain(right.output_symbols())
            .filter(|symbol| declared.contains(symbol) || hashes.contains_symbol(symbol))
            .collect();
        node.left = Box::new(left);
        node.right = Box::new(right);
        node.left_hash_symbol = Some(left_hash_symbol);
        node.right_hash_symbol = Some(right_hash_symbol);
        Ok(PlanWithProperties::new(PlanNode::Join(node), hashes))
    }

    fn plan_semi_join(&mut self, mut node: SemiJoinNode) -> StrataResult<PlanWithProperties> {
        let source_hash = required_hash(std::slice::from_ref(&node.source_join_symbol))?;
        let source_required = HashComputationSet::from(source_hash.clone());
        let source = self.plan_and_enforce(*node.source, &source_required, true, &source_required)?;
        let source_hash_symbol = source.required_hash_symbol(&source_hash)?;

        let filtering_hash =
            required_hash(std::slice::from_ref(&node.filtering_source_join_symbol))?;
        let filtering_required = HashComputationSet::from(filtering_hash.clone());
        let filtering = self.plan_and_enforce(
            *node.filtering_source,
            &filtering_required,
            true,
            &filtering_required,
        )?;
        let filtering_hash_symbol = filtering.required_hash_symbol(&filtering_hash)?;

        let (source, hashes) = source.into_parts();
        node.source = Box::new(source);
        node.filtering_source = Box::new(filtering.into_node());
        node.source_hash_symbol = Some(source_hash_symbol);
        node.filtering_source_hash_symbol = Some(filtering_hash_symbol);
        Ok(PlanWithProperties::new(PlanNode::SemiJoin(node), hashes))
    }

    fn plan_spatial_join(&mut self, mut node: SpatialJoinNode) -> StrataResult<PlanWithProperties> {
        let none = HashComputationSet::new();
        let left = self.plan_and_enforce(*node.left, &none, true, &none)?;
        let right = self.plan_and_enforce(*node.right, &none, true, &none)?;
        ensure!(
            left.hash_symbols().is_empty(),
            InternalError: "probe side of the spatial join should not include hash symbols"
        );
        ensure!(
            right.hash_symbols().is_empty(),
            InternalError: "build side of the spatial join should not include hash symbols"
        );
        node.left = Box::new(left.into_node());
        node.right = Box::new(right.into_node());
        Ok(PlanWithProperties::without_hashes(PlanNode::SpatialJoin(node)))
    }

    fn plan_index_join(&mut self, mut node: IndexJoinNode) -> StrataResult<PlanWithProperties> {
        let probe_keys: Vec<Symbol> = node.criteria.iter().map(|c| c.probe.clone()).collect();
        let probe_hash = required_hash(&probe_keys)?;
        let probe_required = HashComputationSet::from(probe_hash.clone());
        let probe =
            self.plan_and_enforce(*node.probe_source, &probe_required, true, &probe_required)?;
        let probe_hash_symbol = probe.required_hash_symbol(&probe_hash)?;

        let index_keys: Vec<Symbol> = node.criteria.iter().map(|c| c.index.clone()).collect();
        let index_hash = required_hash(&index_keys)?;
        let index_required = HashComputationSet::from(index_hash.clone());
        let index =
            self.plan_and_enforce(*node.index_source, &index_required, true, &index_required)?;
        let index_hash_symbol = index.required_hash_symbol(&index_hash)?;

        let mut hashes = HashSymbolMap::new();
        if node.join_type == IndexJoinType::Inner {
            hashes.extend_from(probe.hash_symbols())?;
        }
        hashes.extend_from(index.hash_symbols())?;

        node.probe_source = Box::new(probe.into_node());
        node.index_source = Box::new(index.into_node());
        node.probe_hash_symbol = Some(probe_hash_symbol);
        node.index_hash_symbol = Some(index_hash_symbol);
        Ok(PlanWithProperties::new(PlanNode::IndexJoin(node), hashes))
    }

    fn plan_exchange(
        &mut self,
        mut node: ExchangeNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        let scheme = &node.partitioning_scheme;
        let mut preference = preference.prune_symbols(&scheme.output_layout);

        // Only the system hash distribution over plain columns can use a
        // precomputed partition hash.
        let partition_hash = if scheme.is_fixed_hash_on_columns() {
            scheme
                .partitioning
                .column_arguments()
                .and_then(|columns| compute_hash(&columns))
        } else {
            None
        };
        preference = preference.with_hash_computation(partition_hash.clone());

        // Every source appends its hash columns in this order.
        let hash_order: Vec<HashComputation> = preference.iter().cloned().collect();
        let mut new_hashes = HashSymbolMap::new();
        let mut new_symbols = Vec::with_capacity(hash_order.len());
        for hash in &hash_order {
            let symbol = self.symbols.new_hash_symbol();
            new_hashes.insert(hash.clone(), symbol.clone())?;
            new_symbols.push(symbol);
        }

        let translations: Vec<_> = (0..node.sources.len())
            .map(|i| node.output_to_input(i))
            .collect();
        let sources = std::mem::take(&mut node.sources);
        let mut new_inputs = Vec::with_capacity(sources.len());
        let mut new_sources = Vec::with_capacity(sources.len());
        for (i, (source, output_to_input)) in sources.into_iter().zip(&translations).enumerate() {
            let translator = |symbol: &Symbol| output_to_input.get(symbol).cloned();
            let source_preference = preference.translate(translator);
            let child =
                self.plan_and_enforce(source, &source_preference, true, &source_preference)?;

            let mut inputs = node.inputs.get(i).cloned().ok_or_else(|| {
                StrataError::internal(format!("Exchange {} has no inputs for source {i}", node.id))
            })?;
            for hash in &hash_order {
                let translated = hash.translate(translator).ok_or_else(|| {
                    StrataError::internal(format!(
                        "Exchange {} cannot translate {hash} into source {i}",
                        node.id
                    ))
                })?;
                inputs.push(child.required_hash_symbol(&translated)?);
            }
            new_inputs.push(inputs);
            new_sources.push(child.into_node());
        }

        if !new_symbols.is_empty() {
            trace!(
                "Exchange {} gained hash columns {:?}",
                node.id,
                new_symbols.iter().map(Symbol::name).collect::<Vec<_>>()
            );
        }
        let scheme = &mut node.partitioning_scheme;
        scheme.output_layout.extend(new_symbols);
        scheme.hash_column = partition_hash.and_then(|hash| new_hashes.get(&hash).cloned());
        node.sources = new_sources;
        node.inputs = new_inputs;
        Ok(PlanWithProperties::new(PlanNode::Exchange(node), new_hashes))
    }

    fn plan_union(
        &mut self,
        mut node: UnionNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        let preference = preference.prune_symbols(&node.output_symbols());

        let mut new_hashes = HashSymbolMap::new();
        for hash in preference.iter() {
            new_hashes.insert(hash.clone(), self.symbols.new_hash_symbol())?;
        }

        let translations: Vec<_> = (0..node.sources.len())
            .map(|i| node.output_to_input(i))
            .collect();
        let sources = std::mem::take(&mut node.sources);
        let mut new_sources = Vec::with_capacity(sources.len());
        for (i, (source, output_to_input)) in sources.into_iter().zip(&translations).enumerate() {
            let translator = |symbol: &Symbol| output_to_input.get(symbol).cloned();
            let source_preference = preference.translate(translator);
            let child =
                self.plan_and_enforce(source, &source_preference, true, &source_preference)?;

            for (hash, symbol) in new_hashes.iter() {
                let translated = hash.translate(translator).ok_or_else(|| {
                    StrataError::internal(format!(
                        "Union {} cannot translate {hash} into source {i}",
                        node.id
                    ))
                })?;
                node.symbol_mapping
                    .entry(symbol.clone())
                    .or_default()
                    .push(child.required_hash_symbol(&translated)?);
            }
            new_sources.push(child.into_node());
        }

        if !new_hashes.is_empty() {
            trace!("Union {} gained {} hash columns", node.id, new_hashes.len());
        }
        node.sources = new_sources;
        Ok(PlanWithProperties::new(PlanNode::Union(node), new_hashes))
    }

    fn plan_project(
        &mut self,
        mut node: ProjectNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        let output_to_input = node.identity_translations();
        let source_preference =
            preference.translate(|symbol| output_to_input.get(symbol).cloned());

        // Preference only: a projection never forces materialization below it.
        let (child, child_hashes) = self.plan(*node.source, &source_preference)?.into_parts();

        let mut hashes = HashSymbolMap::new();
        for hash in source_preference.iter() {
            let (symbol, expression) = match child_hashes.get(hash) {
                Some(symbol) => (symbol.clone(), Expression::symbol(symbol)),
                None => (self.symbols.new_hash_symbol(), hash.to_expression()),
            };
            node.assignments.put(symbol.clone(), expression)?;
            hashes.insert(hash.clone(), symbol)?;
        }

        node.source = Box::new(child);
        Ok(PlanWithProperties::new(PlanNode::Project(node), hashes))
    }

    fn plan_unnest(
        &mut self,
        mut node: UnnestNode,
        preference: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        let source_preference = preference.prune_symbols(&node.source.output_symbols());
        let (child, mut hashes) = self.plan(*node.source, &source_preference)?.into_parts();

        hashes.retain(|hash, _| preference.contains(hash));
        for symbol in hashes.values() {
            if !node.replicate_symbols.contains(symbol) {
                node.replicate_symbols.push(symbol.clone());
            }
        }

        node.source = Box::new(child);
        Ok(PlanWithProperties::new(PlanNode::Unnest(node), hashes))
    }

    /// Plan `node`, then enforce `required` if the result falls short.
    ///
    /// With `prune_extras` the result may offer nothing beyond `required`
    /// and `preferred`; otherwise it only has to cover `required`.
    fn plan_and_enforce(
        &mut self,
        node: PlanNode,
        required: &HashComputationSet,
        prune_extras: bool,
        preferred: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        let result = self.plan(node, preferred)?;

        let offered = result.hash_symbols();
        let has_required = required.iter().all(|hash| offered.contains_key(hash));
        let satisfied = if prune_extras {
            has_required
                && offered
                    .keys()
                    .all(|hash| required.contains(hash) || preferred.contains(hash))
        } else {
            has_required
        };

        if satisfied {
            Ok(result)
        } else {
            self.enforce(result, required)
        }
    }

    /// Project away hash symbols outside `required` and compute the missing ones.
    fn enforce(
        &mut self,
        result: PlanWithProperties,
        required: &HashComputationSet,
    ) -> StrataResult<PlanWithProperties> {
        let (node, offered) = result.into_parts();
        let mut assignments = Assignments::new();
        let mut hashes = HashSymbolMap::new();

        for symbol in node.output_symbols() {
            match offered.hash_for(&symbol) {
                Some(hash) if !required.contains(hash) => {}
                Some(hash) => {
                    assignments.put(symbol.clone(), Expression::symbol(&symbol))?;
                    hashes.insert(hash.clone(), symbol)?;
                }
                None => assignments.put(symbol.clone(), Expression::symbol(&symbol))?,
            }
        }

        for hash in required.iter() {
            if !offered.contains_key(hash) {
                let symbol = self.symbols.new_hash_symbol();
                assignments.put(symbol.clone(), hash.to_expression())?;
                hashes.insert(hash.clone(), symbol)?;
            }
        }

        let id = self.ids.next_id();
        trace!(
            "Inserted hash projection {} over {} {} ({} hashes)",
            id,
            node.name(),
            node.id(),
            hashes.len()
        );
        let project = PlanNode::Project(ProjectNode {
            id,
            source: Box::new(node),
            assignments,
        });
        Ok(PlanWithProperties::new(project, hashes))
    }

    /// Keys whose grouping needs no precomputed hash: none at all, or a
    /// single `bigint`, which the executor hashes directly.
    fn can_skip_hash_generation(&self, keys: &[Symbol]) -> bool {
        match keys {
            [] => true,
            [key] => self.types.is(key, &DataType::BigInt),
            _ => false,
        }
    }
}

fn required_hash(keys: &[Symbol]) -> StrataResult<HashComputation> {
    compute_hash(keys)
        .ok_or_else(|| StrataError::internal("cannot require a hash over an empty key list"))
}

//! Precomputed hash generation.
//!
//! Hash-based operators (aggregations, joins, partitioned exchanges and
//! friends) hash the same key columns again and again. This pass computes
//! each needed hash once, as an extra `bigint` column produced low in the
//! plan, and points every consumer at that column.
//!
//! The rewrite is a single recursive traversal. A parent passes down the
//! hashes it would like ([`HashComputationSet`]); each child returns itself
//! together with the hashes its output actually carries
//! ([`PlanWithProperties`]). Where an operator *requires* a hash its child did
//! not provide, a projection computing it is inserted directly above the
//! child.

mod computation;
mod preference;
mod properties;
mod rewriter;

use common_error::StrataResult;
use log::debug;
use strata_plan::PlanNode;

pub use computation::{
    compute_hash, hash_expression, HashComputation, COMBINE_HASH_FUNCTION, HASH_CODE_FUNCTION,
    INITIAL_HASH_VALUE, NULL_HASH_CODE,
};
pub use preference::HashComputationSet;
pub use properties::{HashSymbolMap, PlanWithProperties};

use crate::context::OptimizerContext;
use crate::optimizer::PlanOptimizer;
use rewriter::HashRewriter;

/// Adds precomputed hash columns and annotates hash-consuming operators.
///
/// Disabled through [`OptimizerConfig::optimize_hash_generation`], in which
/// case the plan is returned untouched.
///
/// [`OptimizerConfig::optimize_hash_generation`]: common_config::OptimizerConfig::optimize_hash_generation
#[derive(Debug, Clone, Copy, Default)]
pub struct HashGenerationOptimizer;

impl PlanOptimizer for HashGenerationOptimizer {
    fn name(&self) -> &'static str {
        "HashGeneration"
    }

    fn description(&self) -> &'static str {
        "Computes join, grouping and partitioning hashes once and reuses them"
    }

    fn optimize(&self, plan: PlanNode, context: &mut OptimizerContext) -> StrataResult<PlanNode> {
        if !context.config().optimize_hash_generation {
            debug!("Hash generation disabled, leaving plan {} as is", plan.id());
            return Ok(plan);
        }

        let max_depth = context.config().max_plan_depth;
        let (types, symbols, ids) = context.rewrite_parts();
        debug!(
            "Generating hashes for plan {} ({} operators)",
            plan.id(),
            plan.operator_count()
        );

        let mut rewriter = HashRewriter::new(types, symbols, ids, max_depth);
        let result = rewriter.plan(plan, &HashComputationSet::new())?;
        Ok(result.into_node())
    }
}

//! Optimizer passes for Strata plans.
//!
//! Passes implement [`PlanOptimizer`] and run in order inside an
//! [`Optimizer`]. The default pipeline holds [`HashGenerationOptimizer`].

mod context;
pub mod hash;
mod optimizer;

pub use context::OptimizerContext;
pub use hash::HashGenerationOptimizer;
pub use optimizer::{OptimizedPlan, Optimizer, PassTrace, PlanOptimizer};

use common_error::StrataResult;
use strata_plan::PlanNode;

/// Optimize a plan using the default optimizer.
pub fn optimize(plan: PlanNode, context: &mut OptimizerContext) -> StrataResult<PlanNode> {
    let optimizer = Optimizer::default();
    Ok(optimizer.optimize(plan, context)?.plan)
}

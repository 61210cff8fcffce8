//! Optimizer pass trait and the pipeline that runs passes in order.

use common_error::StrataResult;
use log::debug;
use strata_plan::PlanNode;

use crate::context::OptimizerContext;
use crate::hash::HashGenerationOptimizer;

/// A whole-plan rewrite.
///
/// A pass must return a plan that produces the same rows as its input; it may
/// only add columns, operators that preserve results, or physical annotations.
pub trait PlanOptimizer: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &'static str;

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }

    /// Rewrite `plan`.
    fn optimize(&self, plan: PlanNode, context: &mut OptimizerContext) -> StrataResult<PlanNode>;
}

/// A trace entry for a single pass application.
#[derive(Debug, Clone)]
pub struct PassTrace {
    /// The name of the pass.
    pub pass_name: String,
    /// The plan before the pass (as explain string).
    pub before: String,
    /// The plan after the pass (as explain string).
    pub after: String,
    /// Whether the pass changed the plan.
    pub changed: bool,
}

impl PassTrace {
    /// Create a new trace entry.
    pub fn new(
        pass_name: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
        changed: bool,
    ) -> Self {
        Self {
            pass_name: pass_name.into(),
            before: before.into(),
            after: after.into(),
            changed,
        }
    }
}

/// The result of optimization with optional trace information.
#[derive(Debug, Clone)]
pub struct OptimizedPlan {
    /// The final plan.
    pub plan: PlanNode,
    /// Number of passes that changed the plan.
    pub passes_applied: usize,
    /// Per-pass trace, when tracing is enabled.
    pub trace: Vec<PassTrace>,
}

impl OptimizedPlan {
    /// Format the trace as a human-readable string.
    pub fn format_trace(&self) -> String {
        let mut output = format!("Optimization applied {} passes\n", self.passes_applied);

        if self.trace.is_empty() {
            output.push_str("  (no trace available)\n");
        } else {
            for entry in self.trace.iter().filter(|t| t.changed) {
                output.push_str(&format!("\n--- Pass applied: {} ---\n", entry.pass_name));
                output.push_str("Before:\n");
                output.push_str(&entry.before);
                output.push_str("\nAfter:\n");
                output.push_str(&entry.after);
            }
        }

        output
    }
}

/// Runs a fixed list of passes once each, in order.
pub struct Optimizer {
    passes: Vec<Box<dyn PlanOptimizer>>,
}

impl Optimizer {
    /// Create an optimizer with the given passes.
    pub fn new(passes: Vec<Box<dyn PlanOptimizer>>) -> Self {
        Self { passes }
    }

    /// Append a pass.
    pub fn add_pass<P: PlanOptimizer + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the configured passes, in order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Run every pass over `plan`.
    pub fn optimize(
        &self,
        plan: PlanNode,
        context: &mut OptimizerContext,
    ) -> StrataResult<OptimizedPlan> {
        let enable_trace = context.config().enable_trace;
        let mut current = plan;
        let mut passes_applied = 0;
        let mut trace = Vec::new();

        for pass in &self.passes {
            let before = current.clone();
            current = pass.optimize(current, context)?;

            let changed = current != before;
            if changed {
                passes_applied += 1;
                debug!("Pass '{}' changed the plan", pass.name());
            } else {
                debug!("Pass '{}' left the plan unchanged", pass.name());
            }

            if enable_trace {
                trace.push(PassTrace::new(
                    pass.name(),
                    before.explain(),
                    current.explain(),
                    changed,
                ));
            }
        }

        Ok(OptimizedPlan {
            plan: current,
            passes_applied,
            trace,
        })
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(vec![Box::new(HashGenerationOptimizer)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_config::OptimizerConfig;
    use strata_plan::{DataType, PlanBuilder};

    struct AddLimitPass;

    impl PlanOptimizer for AddLimitPass {
        fn name(&self) -> &'static str {
            "AddLimit"
        }

        fn optimize(
            &self,
            plan: PlanNode,
            context: &mut OptimizerContext,
        ) -> StrataResult<PlanNode> {
            if matches!(plan, PlanNode::Limit(_)) {
                return Ok(plan);
            }
            Ok(PlanNode::Limit(strata_plan::ops::LimitNode {
                id: context.id_allocator().next_id(),
                source: Box::new(plan),
                count: 1000,
                partial: false,
            }))
        }
    }

    fn context_and_plan(config: OptimizerConfig) -> (OptimizerContext, PlanNode) {
        let mut builder = PlanBuilder::new();
        let a = builder.symbol("a", DataType::Varchar);
        let plan = builder.table_scan("t", vec![a]);
        let (symbols, ids) = builder.into_parts();
        (OptimizerContext::new(config, symbols, ids), plan)
    }

    #[test]
    fn test_optimizer_basic() {
        let optimizer = Optimizer::new(vec![Box::new(AddLimitPass)]);
        let (mut context, plan) = context_and_plan(OptimizerConfig::default());

        let result = optimizer.optimize(plan, &mut context).unwrap();

        assert_eq!(result.passes_applied, 1);
        assert!(matches!(result.plan, PlanNode::Limit(_)));
        assert!(result.trace.is_empty());
    }

    #[test]
    fn test_optimizer_with_trace() {
        let optimizer = Optimizer::new(vec![Box::new(AddLimitPass), Box::new(AddLimitPass)]);
        let (mut context, plan) = context_and_plan(OptimizerConfig::default().with_trace(true));

        let result = optimizer.optimize(plan, &mut context).unwrap();

        assert_eq!(result.trace.len(), 2);
        assert!(result.trace[0].changed);
        assert!(!result.trace[1].changed);
        assert!(result.format_trace().contains("Pass applied: AddLimit"));
    }

    #[test]
    fn test_default_pipeline() {
        assert_eq!(Optimizer::default().pass_names(), vec!["HashGeneration"]);
    }
}

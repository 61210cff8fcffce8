//! Per-run state shared by optimizer passes.

use common_config::OptimizerConfig;
use strata_plan::{PlanNodeIdAllocator, SymbolAllocator, TypeProvider};

/// Configuration, symbol types and allocators for one optimizer run.
///
/// A context is owned by a single run; the allocators are handed back with
/// [`OptimizerContext::into_allocators`] once it finishes.
#[derive(Debug, Clone)]
pub struct OptimizerContext {
    config: OptimizerConfig,
    types: TypeProvider,
    symbols: SymbolAllocator,
    ids: PlanNodeIdAllocator,
}

impl OptimizerContext {
    /// Context over `symbols` and `ids`, typing symbols from the allocator.
    pub fn new(
        config: OptimizerConfig,
        symbols: SymbolAllocator,
        ids: PlanNodeIdAllocator,
    ) -> Self {
        Self {
            config,
            types: symbols.types(),
            symbols,
            ids,
        }
    }

    /// Replace the symbol types.
    #[must_use]
    pub fn with_types(mut self, types: TypeProvider) -> Self {
        self.types = types;
        self
    }

    /// Optimizer configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Symbol types as of context creation.
    pub fn types(&self) -> &TypeProvider {
        &self.types
    }

    /// Symbol allocator.
    pub fn symbol_allocator(&mut self) -> &mut SymbolAllocator {
        &mut self.symbols
    }

    /// Node id allocator.
    pub fn id_allocator(&mut self) -> &mut PlanNodeIdAllocator {
        &mut self.ids
    }

    /// Split borrow for passes that read types while allocating.
    pub(crate) fn rewrite_parts(
        &mut self,
    ) -> (&TypeProvider, &mut SymbolAllocator, &mut PlanNodeIdAllocator) {
        (&self.types, &mut self.symbols, &mut self.ids)
    }

    /// Hand back the allocators.
    pub fn into_allocators(self) -> (SymbolAllocator, PlanNodeIdAllocator) {
        (self.symbols, self.ids)
    }
}

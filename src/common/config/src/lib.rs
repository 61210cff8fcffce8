//! Configuration management for Strata.
//!
//! Provides the session-level knobs read by the planner. Every section
//! deserializes with defaults, so a partial document is enough.

use common_error::StrataResult;
use serde::{Deserialize, Serialize};

/// Default bound on plan depth accepted by recursive planner passes.
pub const DEFAULT_MAX_PLAN_DEPTH: usize = 256;

/// Global Strata configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StrataConfig {
    /// Optimizer configuration.
    pub optimizer: OptimizerConfig,
}

impl StrataConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json(json: &str) -> StrataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize this configuration to a JSON document.
    pub fn to_json(&self) -> StrataResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Optimizer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Precompute hash columns for grouping, joins and repartitioning.
    pub optimize_hash_generation: bool,
    /// Deepest plan a recursive pass will descend into.
    pub max_plan_depth: usize,
    /// Record a before/after trace for every optimizer pass.
    pub enable_trace: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            optimize_hash_generation: true,
            max_plan_depth: DEFAULT_MAX_PLAN_DEPTH,
            enable_trace: false,
        }
    }
}

impl OptimizerConfig {
    /// Enable or disable hash generation.
    #[must_use]
    pub fn with_hash_generation(mut self, enabled: bool) -> Self {
        self.optimize_hash_generation = enabled;
        self
    }

    /// Set the maximum plan depth.
    #[must_use]
    pub fn with_max_plan_depth(mut self, depth: usize) -> Self {
        self.max_plan_depth = depth;
        self
    }

    /// Enable or disable tracing.
    #[must_use]
    pub fn with_trace(mut self, enable: bool) -> Self {
        self.enable_trace = enable;
        self
    }
}

//! Strata - plan rewriting for a distributed SQL planner
//!
//! Strata holds the relational plan IR and the optimizer passes that rewrite
//! it, starting with precomputed hash generation for hash-based operators.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_error as error;
pub use strata_optimizer as optimizer;
pub use strata_plan as plan;

/// Strata version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

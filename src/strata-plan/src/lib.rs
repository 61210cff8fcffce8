//! Relational plan IR for the Strata planner.
//!
//! `strata-plan` defines the tree that optimizer passes rewrite:
//!
//! - **Symbols**: opaque column identifiers, their SQL types, and the allocator
//!   that mints fresh ones
//! - **Expressions**: scalar expressions and projection assignments
//! - **Operators**: the closed [`PlanNode`] sum type, one variant per operator kind
//! - **Plan Building**: [`PlanBuilder`] for assembling plans programmatically
//! - **Validation**: symbol dependency checks over a whole tree
//!
//! # Example
//!
//! ```rust
//! use strata_plan::{DataType, PlanBuilder};
//!
//! let mut builder = PlanBuilder::new();
//! let name = builder.symbol("name", DataType::Varchar);
//! let scan = builder.table_scan("person", vec![name.clone()]);
//! let plan = builder.aggregation(scan, vec![name], Default::default());
//!
//! assert_eq!(plan.operator_count(), 2);
//! println!("{}", plan.explain());
//! ```

mod builder;
pub mod expr;
mod id;
pub mod ops;
mod plan;
mod symbol;
mod validation;

pub use builder::PlanBuilder;
pub use id::{PlanNodeId, PlanNodeIdAllocator};
pub use ops::PlanNode;
pub use symbol::{DataType, Symbol, SymbolAllocator, TypeProvider, HASH_SYMBOL_HINT};
pub use validation::{validate_dependencies, DependencyError, DependencyValidator};

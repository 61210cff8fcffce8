//! Error types and result aliases for Strata.
//!
//! Every planner crate reports failures through [`StrataError`]. Broken
//! planner invariants are `InternalError`s and abort the planning attempt.

mod error;

pub use error::{StrataError, StrataResult};

//! Sort orderings shared by sorting, windowing and merging exchanges.

use serde::{Deserialize, Serialize};

use crate::Symbol;

/// Sort direction and null placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortOrder {
    /// Ascending, nulls last.
    #[default]
    AscNullsLast,
    /// Ascending, nulls first.
    AscNullsFirst,
    /// Descending, nulls last.
    DescNullsLast,
    /// Descending, nulls first.
    DescNullsFirst,
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderingScheme {
    /// Sort keys, most significant first.
    pub order_by: Vec<(Symbol, SortOrder)>,
}

impl OrderingScheme {
    /// Ascending ordering over `symbols`.
    pub fn ascending(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            order_by: symbols
                .into_iter()
                .map(|s| (s, SortOrder::AscNullsLast))
                .collect(),
        }
    }

    /// The sort key symbols.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.order_by.iter().map(|(s, _)| s.clone()).collect()
    }
}

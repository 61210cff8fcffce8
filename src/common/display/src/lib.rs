//! Display and visualization utilities for Strata.
//!
//! Provides formatting for plan trees.

mod tree;

pub use tree::{DisplayTree, TreeNode};

/// Join displayable items with `", "` inside square brackets.
pub fn bracketed<T: std::fmt::Display>(items: &[T]) -> String {
    let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracketed() {
        assert_eq!(bracketed(&["a", "b"]), "[a, b]");
        assert_eq!(bracketed::<String>(&[]), "[]");
    }
}

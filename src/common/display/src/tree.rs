//! Tree display utilities for query plans.

use std::fmt;

/// A node in a display tree.
pub trait TreeNode {
    /// One-line label of this node.
    fn label(&self) -> String;

    /// Child nodes, in display order.
    fn children(&self) -> Vec<&dyn TreeNode>;

    /// Extra lines printed under the label.
    fn details(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Renders a [`TreeNode`] hierarchy with box-drawing connectors.
pub struct DisplayTree<'a> {
    root: &'a dyn TreeNode,
}

impl<'a> DisplayTree<'a> {
    /// Create a new display tree.
    pub fn new(root: &'a dyn TreeNode) -> Self {
        Self { root }
    }

    fn fmt_node(
        f: &mut fmt::Formatter<'_>,
        node: &dyn TreeNode,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let connector = if is_last { "└─ " } else { "├─ " };
        writeln!(f, "{prefix}{connector}{}", node.label())?;

        let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });
        let children = node.children();
        let detail_prefix = if children.is_empty() {
            format!("{child_prefix}   ")
        } else {
            format!("{child_prefix}│  ")
        };
        for line in node.details() {
            writeln!(f, "{detail_prefix}{line}")?;
        }

        for (i, child) in children.iter().enumerate() {
            Self::fmt_node(f, *child, &child_prefix, i == children.len() - 1)?;
        }

        Ok(())
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.root.label())?;

        let children = self.root.children();
        let detail_prefix = if children.is_empty() { "   " } else { "│  " };
        for line in self.root.details() {
            writeln!(f, "{detail_prefix}{line}")?;
        }

        for (i, child) in children.iter().enumerate() {
            Self::fmt_node(f, *child, "", i == children.len() - 1)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        label: &'static str,
        outputs: Vec<&'static str>,
        children: Vec<TestNode>,
    }

    impl TreeNode for TestNode {
        fn label(&self) -> String {
            self.label.to_string()
        }

        fn children(&self) -> Vec<&dyn TreeNode> {
            self.children.iter().map(|c| c as &dyn TreeNode).collect()
        }

        fn details(&self) -> Vec<String> {
            if self.outputs.is_empty() {
                Vec::new()
            } else {
                vec![format!("outputs: [{}]", self.outputs.join(", "))]
            }
        }
    }

    #[test]
    fn test_display_tree() {
        let tree = TestNode {
            label: "Join",
            outputs: vec!["a", "b"],
            children: vec![
                TestNode {
                    label: "Scan(l)",
                    outputs: vec!["a"],
                    children: vec![],
                },
                TestNode {
                    label: "Scan(r)",
                    outputs: vec![],
                    children: vec![],
                },
            ],
        };

        let output = DisplayTree::new(&tree).to_string();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], "Join");
        assert_eq!(lines[1], "│  outputs: [a, b]");
        assert_eq!(lines[2], "├─ Scan(l)");
        assert_eq!(lines[3], "│     outputs: [a]");
        assert_eq!(lines[4], "└─ Scan(r)");
    }
}

//! Plan node identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a plan node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanNodeId(u64);

impl PlanNodeId {
    /// Wrap a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlanNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out fresh node ids, one session at a time.
#[derive(Debug, Clone, Default)]
pub struct PlanNodeIdAllocator {
    next_id: u64,
}

impl PlanNodeIdAllocator {
    /// Create an allocator starting at zero.
    pub const fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Create an allocator whose first id is `start`.
    pub const fn starting_at(start: u64) -> Self {
        Self { next_id: start }
    }

    /// Allocate the next id.
    pub fn next_id(&mut self) -> PlanNodeId {
        let id = PlanNodeId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut ids = PlanNodeIdAllocator::starting_at(10);
        assert_eq!(ids.next_id(), PlanNodeId::new(10));
        assert_eq!(ids.next_id().get(), 11);
    }
}

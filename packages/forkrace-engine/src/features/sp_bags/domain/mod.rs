//! Bag domain types
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a bag in the forest
///
/// Handles are stable: a bag keeps its index after being unioned, and
/// `find` maps it to the current representative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BagId(pub u32);

impl BagId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bag{}", self.0)
    }
}

/// Ordering class of a bag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BagKind {
    /// Accesses are ordered before the running strand
    Series,
    /// Accesses may run concurrently with the running strand
    Parallel,
}

impl BagKind {
    pub fn is_parallel(&self) -> bool {
        matches!(self, BagKind::Parallel)
    }
}

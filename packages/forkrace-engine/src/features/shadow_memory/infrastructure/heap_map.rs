//! Heap ownership map
//!
//! Mirrors the instrumented program's live heap blocks so a free, which only
//! reports an address, can be turned into a byte range.

use crate::shared::models::Address;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct HeapMap {
    blocks: FxHashMap<Address, usize>,
}

impl HeapMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a live block, replacing any stale entry at the same address
    pub fn insert(&mut self, addr: Address, size: usize) {
        self.blocks.insert(addr, size);
    }

    /// Forget a block, returning its size if it was known
    pub fn remove(&mut self, addr: Address) -> Option<usize> {
        self.blocks.remove(&addr)
    }

    #[cfg(test)]
    pub fn size_of(&self, addr: Address) -> Option<usize> {
        self.blocks.get(&addr).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

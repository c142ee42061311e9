//! Bag forest (disjoint-set union over strands)
//!
//! Arena-backed union-find with:
//! - Path compression: O(α(n)) find operations
//! - Union by rank: balanced trees
//! - Kind tags on representatives: the ordering class of the whole set
//!
//! Bags are never removed; a bag that no frame or shadow record refers to is
//! simply never looked up again.

use crate::errors::{DetectorError, Result};
use crate::features::sp_bags::domain::{BagId, BagKind};
use tracing::debug;

/// Union-find forest of S/P bags
#[derive(Debug, Clone)]
pub struct BagForest {
    /// Parent pointers (self-loop = root)
    parent: Vec<u32>,

    /// Rank (tree height upper bound) for union by rank
    rank: Vec<u8>,

    /// Kind of each set (only valid for roots)
    kind: Vec<BagKind>,

    /// Maximum number of bags (0 = unlimited)
    max_bags: usize,
}

impl Default for BagForest {
    fn default() -> Self {
        Self::new(0)
    }
}

impl BagForest {
    /// Create an empty forest; `max_bags == 0` means unlimited
    pub fn new(max_bags: usize) -> Self {
        Self {
            parent: Vec::new(),
            rank: Vec::new(),
            kind: Vec::new(),
            max_bags,
        }
    }

    /// Create a singleton bag
    pub fn make_bag(&mut self, kind: BagKind) -> Result<BagId> {
        let idx = self.parent.len();
        if self.max_bags != 0 && idx >= self.max_bags {
            return Err(DetectorError::exhausted("bag forest", self.max_bags));
        }
        let id = u32::try_from(idx)
            .map_err(|_| DetectorError::exhausted("bag forest", u32::MAX as usize))?;
        self.parent.push(id);
        self.rank.push(0);
        self.kind.push(kind);
        Ok(BagId(id))
    }

    /// Find the representative of `bag` with path compression
    ///
    /// Iterative so that long union chains cannot overflow the stack.
    #[inline]
    pub fn find(&mut self, bag: BagId) -> BagId {
        let mut root = bag.0;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }

        let mut current = bag.0;
        while self.parent[current as usize] != root {
            let next = self.parent[current as usize];
            self.parent[current as usize] = root;
            current = next;
        }
        BagId(root)
    }

    /// Find without path compression
    #[cfg(test)]
    pub fn find_readonly(&self, bag: BagId) -> BagId {
        let mut current = bag.0;
        while self.parent[current as usize] != current {
            current = self.parent[current as usize];
        }
        BagId(current)
    }

    /// Kind of the set containing `bag`
    #[inline]
    pub fn kind_of(&mut self, bag: BagId) -> BagKind {
        let root = self.find(bag);
        self.kind[root.index()]
    }

    /// Check if accesses recorded under `bag` may be concurrent with the running strand
    #[inline]
    pub fn is_parallel(&mut self, bag: BagId) -> bool {
        self.kind_of(bag).is_parallel()
    }

    /// Retag the set containing `bag`
    pub fn set_kind(&mut self, bag: BagId, kind: BagKind) {
        let root = self.find(bag);
        self.kind[root.index()] = kind;
    }

    /// Union `src` into `dst`; the merged set takes the kind of `dst`
    ///
    /// Returns the new representative.
    pub fn union_into(&mut self, dst: BagId, src: BagId) -> BagId {
        let root_dst = self.find(dst);
        let root_src = self.find(src);
        if root_dst == root_src {
            return root_dst;
        }

        let kind = self.kind[root_dst.index()];
        let rd = root_dst.index();
        let rs = root_src.index();

        let new_root = if self.rank[rd] < self.rank[rs] {
            self.parent[rd] = root_src.0;
            root_src
        } else if self.rank[rd] > self.rank[rs] {
            self.parent[rs] = root_dst.0;
            root_dst
        } else {
            self.parent[rs] = root_dst.0;
            self.rank[rd] += 1;
            root_dst
        };

        self.kind[new_root.index()] = kind;
        debug!(target: "forkrace::bags", "union {} into {} -> {} ({:?})", src, dst, new_root, kind);
        new_root
    }

    /// Check if two bags are in the same set
    #[cfg(test)]
    pub fn connected(&mut self, a: BagId, b: BagId) -> bool {
        self.find(a) == self.find(b)
    }

    /// Total number of bags ever created
    #[inline]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}

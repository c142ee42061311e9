use crate::errors::{DetectorError, Result};
use crate::shared::models::LockId;
use std::sync::Arc;

/// Locks held at the time of an access, sorted and deduplicated
///
/// `None` is the empty set; most programs never take a lock, so the common
/// case costs nothing to store in a shadow record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockSnapshot(Option<Arc<[LockId]>>);

impl LockSnapshot {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn locks(&self) -> &[LockId] {
        self.0.as_deref().unwrap_or(&[])
    }

    /// Check if both snapshots hold a common lock
    pub fn intersects(&self, other: &LockSnapshot) -> bool {
        let (a, b) = (self.locks(), other.locks());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }
}

/// Locks currently held by the running strand
///
/// Locks are reentrant: each acquire increments a count and the lock leaves
/// the set once every acquire has been released.
#[derive(Debug, Clone, Default)]
pub struct LockSet {
    /// Sorted by lock id
    held: Vec<(LockId, u32)>,
    /// Cached snapshot, invalidated on every change
    snapshot: LockSnapshot,
}

impl LockSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, lock: LockId) {
        match self.held.binary_search_by(|(held, _)| held.cmp(&lock)) {
            Ok(pos) => self.held[pos].1 += 1,
            Err(pos) => {
                self.held.insert(pos, (lock, 1));
                self.refresh();
            }
        }
    }

    /// Release one hold of `lock`
    pub fn release(&mut self, lock: LockId) -> Result<()> {
        let pos = self
            .held
            .binary_search_by(|(held, _)| held.cmp(&lock))
            .map_err(|_| {
                DetectorError::model_violation("lock_release", format!("{} is not held", lock))
            })?;

        self.held[pos].1 -= 1;
        if self.held[pos].1 == 0 {
            self.held.remove(pos);
            self.refresh();
        }
        Ok(())
    }

    pub fn holds(&self, lock: LockId) -> bool {
        self.held
            .binary_search_by(|(held, _)| held.cmp(&lock))
            .is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Snapshot of the held locks for a shadow record
    #[inline]
    pub fn snapshot(&self) -> LockSnapshot {
        self.snapshot.clone()
    }

    /// Snapshot of the held locks plus one extra lock, without changing the set
    pub fn snapshot_with(&self, extra: LockId) -> LockSnapshot {
        if self.holds(extra) {
            return self.snapshot();
        }
        let mut locks: Vec<LockId> = self.held.iter().map(|(lock, _)| *lock).collect();
        let pos = locks.binary_search(&extra).unwrap_or_else(|pos| pos);
        locks.insert(pos, extra);
        LockSnapshot(Some(locks.into()))
    }

    fn refresh(&mut self) {
        self.snapshot = if self.held.is_empty() {
            LockSnapshot::empty()
        } else {
            LockSnapshot(Some(self.held.iter().map(|(lock, _)| *lock).collect()))
        };
    }
}

//! Shadow memory domain types
use crate::features::locksets::LockSnapshot;
use crate::features::race_report::RaceKind;
use crate::features::sp_bags::BagId;
use crate::shared::models::{AccessLoc, Address, AllocKind};
use std::sync::Arc;

/// Last access of one kind to a byte
///
/// One record is shared by every byte the access covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    /// Bag of the strand that made the access
    pub bag: BagId,
    pub loc: AccessLoc,
    pub locks: LockSnapshot,
    /// Access went through a private reducer view
    pub via_view: bool,
}

/// Allocation or free event stamped over a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocStamp {
    pub record: Arc<AccessRecord>,
    pub origin: AllocKind,
}

impl AllocStamp {
    pub fn is_free(&self) -> bool {
        self.record.loc.kind.is_write()
    }
}

/// Memory event checked and recorded by `ShadowMemory::apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryEvent {
    Read { addr: Address, size: usize },
    Write { addr: Address, size: usize },
    Alloc { addr: Address, size: usize, origin: AllocKind },
    Free { addr: Address, size: usize, origin: AllocKind },
}

impl MemoryEvent {
    pub fn addr(&self) -> Address {
        match *self {
            MemoryEvent::Read { addr, .. }
            | MemoryEvent::Write { addr, .. }
            | MemoryEvent::Alloc { addr, .. }
            | MemoryEvent::Free { addr, .. } => addr,
        }
    }

    pub fn size(&self) -> usize {
        match *self {
            MemoryEvent::Read { size, .. }
            | MemoryEvent::Write { size, .. }
            | MemoryEvent::Alloc { size, .. }
            | MemoryEvent::Free { size, .. } => size,
        }
    }
}

/// Earlier access found to race with the current one
#[derive(Debug, Clone)]
pub struct RaceCandidate {
    pub prior: Arc<AccessRecord>,
    pub kind: RaceKind,
    /// First byte at which the conflict was seen
    pub addr: Address,
}

/// Half-open byte range `[addr, addr + size)`, clamped to the address space
#[inline]
pub fn range_end(addr: Address, size: usize) -> Address {
    addr.saturating_add(size as u64)
}

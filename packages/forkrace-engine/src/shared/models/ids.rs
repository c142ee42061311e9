//! Identifier types
//!
//! Instruction ids come from the instrumentation shim and are stable for the
//! lifetime of a run. Addresses are plain integers: the engine only mirrors the
//! instrumented program's memory, it never dereferences it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address in the instrumented program's address space
pub type Address = u64;

/// Identity of an accumulator: the address of its leftmost view
pub type ReducerKey = Address;

/// Index of a sync region within a frame
pub type SyncRegionId = u32;

/// Source-instruction id assigned by the instrumentation shim
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrId(pub u64);

impl InstrId {
    /// Create an instruction id
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for InstrId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Lock identity held by a strand
///
/// Program locks and the synthetic per-address locks used for atomic
/// operations live in separate namespaces so they can never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LockId {
    /// Lock object reported by the shim (mutex address or handle)
    Mutex(u64),
    /// Synthetic lock guarding one atomic location
    Atomic(Address),
}

impl LockId {
    /// Synthetic lock for an atomic access to `addr`
    pub const fn for_atomic(addr: Address) -> Self {
        LockId::Atomic(addr)
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockId::Mutex(id) => write!(f, "lock {:#x}", id),
            LockId::Atomic(addr) => write!(f, "atomic {:#x}", addr),
        }
    }
}

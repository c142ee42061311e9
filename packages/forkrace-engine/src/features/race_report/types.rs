//! Race domain models
use crate::shared::models::{AccessKind, AccessLoc, Address, AllocKind, InstrId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Race classification, named by (later access) after (earlier access)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaceKind {
    WriteAfterWrite,
    WriteAfterRead,
    ReadAfterWrite,
}

impl RaceKind {
    /// Classify a race from the earlier and later access kinds
    ///
    /// Frees count as writes. Returns `None` for read/read pairs, which never race.
    pub fn classify(earlier: AccessKind, later: AccessKind) -> Option<Self> {
        match (earlier.is_write(), later.is_write()) {
            (true, true) => Some(RaceKind::WriteAfterWrite),
            (false, true) => Some(RaceKind::WriteAfterRead),
            (true, false) => Some(RaceKind::ReadAfterWrite),
            (false, false) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RaceKind::WriteAfterWrite => "write-after-write",
            RaceKind::WriteAfterRead => "write-after-read",
            RaceKind::ReadAfterWrite => "read-after-write",
        }
    }
}

impl fmt::Display for RaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allocation (or free) that last touched the racing address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocContext {
    pub loc: AccessLoc,
    pub origin: AllocKind,
}

/// One detected race
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceRecord {
    pub kind: RaceKind,
    /// Earlier access (from the shadow record)
    pub first: AccessLoc,
    /// Access that discovered the race
    pub second: AccessLoc,
    pub addr: Address,
    pub alloc: Option<AllocContext>,
}

impl RaceRecord {
    /// Key used to bucket races: the larger instruction id
    pub fn bucket(&self) -> InstrId {
        self.first.id.max(self.second.id)
    }

    /// Check if both records describe the same pair of instructions
    pub fn same_race(&self, other: &RaceRecord) -> bool {
        let (a, b) = (self.first.id, self.second.id);
        let (c, d) = (other.first.id, other.second.id);
        (a == c && b == d) || (a == d && b == c)
    }
}

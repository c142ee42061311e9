//! Memory access models
use super::call_stack::CallStack;
use super::ids::InstrId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of memory event observed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    /// Load
    Read,
    /// Store
    Write,
    /// Heap or stack allocation
    Alloc,
    /// Heap free or stack release
    Free,
}

impl AccessKind {
    /// Check if this event conflicts like a write (store or free)
    pub fn is_write(&self) -> bool {
        matches!(self, AccessKind::Write | AccessKind::Free)
    }

    /// Check if this is a plain load
    pub fn is_read(&self) -> bool {
        matches!(self, AccessKind::Read)
    }

    /// Human-readable name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessKind::Read => "Read",
            AccessKind::Write => "Write",
            AccessKind::Alloc => "Allocation",
            AccessKind::Free => "Free",
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a tracked allocation lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocKind {
    Heap,
    Stack,
}

impl AllocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocKind::Heap => "Heap",
            AllocKind::Stack => "Stack",
        }
    }
}

/// Static properties the shim attaches to a load or store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessProps {
    /// Read of memory the compiler proved constant
    pub is_constant: bool,
    /// Address lies on the current stack frame
    pub on_stack: bool,
    /// Stack address may escape to another strand
    pub may_be_captured: bool,
    /// Atomic load/store
    pub is_atomic: bool,
}

impl AccessProps {
    /// Properties of an ordinary heap/global access
    pub fn plain() -> Self {
        Self::default()
    }

    /// Stack access whose address escapes
    pub fn captured_stack() -> Self {
        Self {
            on_stack: true,
            may_be_captured: true,
            ..Self::default()
        }
    }

    /// Atomic access
    pub fn atomic() -> Self {
        Self {
            is_atomic: true,
            ..Self::default()
        }
    }

    /// Accesses the race check can skip entirely
    ///
    /// Constant reads never conflict, and stack slots that never escape are
    /// only reachable from their own frame.
    pub fn is_uncheckable(&self, kind: AccessKind) -> bool {
        (self.is_constant && kind.is_read()) || (self.on_stack && !self.may_be_captured)
    }
}

/// Access location: instruction id plus the call stack at the time of access
///
/// Immutable once recorded; the call stack is structurally shared so cloning
/// a location is O(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLoc {
    /// Instruction that performed the access
    pub id: InstrId,
    /// What the instruction did
    pub kind: AccessKind,
    /// Call stack snapshot
    pub stack: CallStack,
}

impl AccessLoc {
    pub fn new(id: InstrId, kind: AccessKind, stack: CallStack) -> Self {
        Self { id, kind, stack }
    }
}

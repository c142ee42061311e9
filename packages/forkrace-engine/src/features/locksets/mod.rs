//! Lock-set tracking
//!
//! Two accesses that are concurrent in the bag forest are still excluded from
//! racing when both were made under a common lock. Atomic accesses can be
//! checked under a synthetic per-address lock, so they exclude each other but
//! still race with plain accesses to the same location.

pub mod lock_set;

pub use lock_set::{LockSet, LockSnapshot};

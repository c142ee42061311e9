//! Feature slices
//!
//! Leaves first: the bag forest and lock sets know nothing about frames.
//! Shadow memory sees bags, lock snapshots and race kinds, never frames or
//! views. The engine wires the slices together.

pub mod frames;
pub mod locksets;
pub mod race_report;
pub mod reducers;
pub mod shadow_memory;
pub mod sp_bags;

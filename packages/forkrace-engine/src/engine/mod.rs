//! Detector engine
//!
//! Application layer: wires the feature slices together behind the hook
//! entry points the instrumentation shim calls.
//!
//! - `detector`: context object, lifecycle and report emission
//! - `control`: calls, spawns, syncs, parallel loops
//! - `memory`: loads, stores, allocations, stack ranges, locks
//! - `reducers`: accumulator registration, lookup and view reconciliation
//! - `hooks`: `ShimEvent` and dispatch
//! - `stats`: optional counters

mod control;
pub mod detector;
pub mod hooks;
mod memory;
mod reducers;
pub mod stats;

pub use detector::Detector;
pub use hooks::ShimEvent;
pub use stats::EngineStats;

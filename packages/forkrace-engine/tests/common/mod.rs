//! Common test utilities for forkrace-engine
//!
//! - `builders`: `ProgramBuilder` scripting shim event traces
//! - `heap`: `TestHeap` view allocator and sample reducer operations

#![allow(dead_code)]

mod builders;
mod heap;

pub use builders::*;
pub use heap::*;

use forkrace_engine::{Detector, DetectorConfig, RaceKind};

/// Detector with a fresh test heap
pub fn detector_with(config: DetectorConfig) -> (Detector, TestHeap) {
    let heap = TestHeap::new();
    let detector = Detector::new(config, Box::new(heap.clone())).unwrap();
    (detector, heap)
}

/// Default detector with a fresh test heap
pub fn detector() -> (Detector, TestHeap) {
    detector_with(DetectorConfig::default())
}

/// Replay `events` on a default detector and finish it
pub fn run(events: Vec<forkrace_engine::ShimEvent>) -> (Detector, forkrace_engine::RaceSummary) {
    let (mut detector, _heap) = detector();
    detector.replay(events).unwrap();
    let summary = detector.finish().unwrap();
    (detector, summary)
}

/// `(kind, first id, second id)` of every distinct race, in discovery order
pub fn race_pairs(summary: &forkrace_engine::RaceSummary) -> Vec<(RaceKind, u64, u64)> {
    summary
        .races
        .iter()
        .map(|entry| {
            (
                entry.record.kind,
                entry.record.first.id.raw(),
                entry.record.second.id.raw(),
            )
        })
        .collect()
}

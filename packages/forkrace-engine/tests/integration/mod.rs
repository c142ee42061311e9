//! Integration tests for forkrace-engine
//!
//! Drives the public `Detector` API with scripted fork-join programs:
//! - `races`: SP ordering, classification, dedup, locks, atomics, memory reuse
//! - `reducers`: view creation, merge order and reduced values
//! - `lifecycle`: model violations, poisoning, pause-on-race, checking switches
//! - `reporting`: text/JSON reports, destinations, stats
//! - `config_loading`: YAML files and environment overlay

#[path = "../common/mod.rs"]
mod common;

mod lifecycle;
mod reducers;

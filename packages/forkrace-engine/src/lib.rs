/*
 * Forkrace Engine - Determinacy-race detection for fork-join programs
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (ids, access locations, call stacks)
 * - features/    : Vertical slices (sp_bags → frames → locksets → shadow_memory → reducers → race_report)
 * - config/      : Detector configuration (presets, YAML, env overlay)
 * - engine/      : Detector context wiring the features to the shim hooks
 *
 * Execution model:
 * - One detector per instrumented run, driven from a single worker
 * - SP-bags ordering via an index-based union-find forest
 */

#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::too_many_arguments)] // Shim hooks carry the full access payload
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::len_without_is_empty)] // Size accessors for stats only
#![allow(clippy::should_implement_trait)] // from_str naming intentional

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and utilities
#[macro_use]
pub mod shared;

/// Crate-wide error type
pub mod errors;

/// Detector configuration
pub mod config;

/// Feature slices (bags, frames, locksets, shadow memory, reducers, reporting)
pub mod features;

/// Detector context and shim entry points
pub mod engine;

pub use config::{DetectorConfig, Preset};
pub use engine::{Detector, EngineStats, ShimEvent};
pub use errors::{DetectorError, Result};
pub use features::race_report::{RaceKind, RaceSummary};
pub use features::reducers::{ReducerOps, ViewAllocator};
pub use shared::models::*;

//! Shared models used by every feature slice
//!
//! Identifiers, access descriptions and call-stack snapshots live here so the
//! feature modules (bags, frames, shadow memory, reducers, reporting) can
//! exchange them without depending on each other.

#[macro_use]
pub mod macros;
pub mod models;

pub use models::*;

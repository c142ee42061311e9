/// Race Report Feature
///
/// Classification, deduplication and rendering of detected races.
///
/// ## Architecture
/// - **types**: RaceKind, RaceRecord, AllocContext
/// - **race_log**: RaceLog (dedup by unordered instruction pair)
/// - **writer**: text and JSON rendering, RaceSummary
pub mod race_log;
pub mod types;
pub mod writer;

pub use race_log::{RaceEntry, RaceLog};
pub use types::*;
pub use writer::{RaceSummary, ReportWriter};

/// Shadow Memory Feature
///
/// Per-byte record of the last reader, last writer and last allocation event
/// of every monitored address, and the race-check predicate over them.
///
/// ## Architecture
/// - **Domain**: AccessRecord, AllocStamp, MemoryEvent, RaceCandidate
/// - **Infrastructure**: LineTable (64-byte lines), ShadowMemory, HeapMap
///
/// ## Race predicate
/// An earlier record races with the current access when
/// 1. at least one of them writes (frees count as writes)
/// 2. the earlier record was not made through a reducer view
/// 3. their lock sets are disjoint
/// 4. the earlier record's bag is now Parallel
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;

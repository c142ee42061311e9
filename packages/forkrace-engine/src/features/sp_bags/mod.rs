/// SP-Bags Feature
///
/// Series-parallel ordering of strands via a disjoint-set forest.
///
/// ## Architecture
/// - **Domain**: BagId, BagKind
/// - **Infrastructure**: BagForest (arena-backed union-find)
///
/// ## Algorithm
/// Every frame owns one Series bag and one Parallel bag per sync region.
/// A finished child is unioned into its parent's Parallel bag (spawned) or
/// Series bag (called); a sync unions the Parallel bag into the Series bag.
/// An earlier access is concurrent with the running strand iff the set that
/// now contains its recorded bag is Parallel.
///
/// ## Academic References
/// - Feng & Leiserson, "Efficient Detection of Determinacy Races in Cilk
///   Programs" (SPAA 1997)
/// - Tarjan, R. E. "Efficiency of a Good But Not Linear Set Union Algorithm" (1975)
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;

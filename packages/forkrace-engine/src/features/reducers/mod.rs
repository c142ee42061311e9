/// Reducer Feature
///
/// Private views of accumulators and their reconciliation at sync points.
///
/// ## Architecture
/// - **Ports**: ReducerOps (identity/reduce capability), ViewAllocator
/// - **Domain**: ViewEntry, ViewTable, merge_tables, reduce_into_leftmost
///
/// ## Merge order
/// The left operand of every reduce is the view that precedes the other in
/// program order, whichever table is larger. Results are well defined only
/// when the reduce operation is associative.
pub mod domain;
pub mod ports;

pub use domain::*;
pub use ports::*;

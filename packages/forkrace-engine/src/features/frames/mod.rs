/// Frames Feature
///
/// Models activations of the instrumented program and drives the bag forest
/// at every control-flow event.
///
/// ## Architecture
/// - **Domain**: FrameKind, Frame, SyncRegion, Join
/// - **Infrastructure**: FrameStack (bag transitions), StackRanges
///
/// ## Frame kinds
/// - `Root`: the program's initial activation
/// - `Function` / `Helper`: called activations (helpers wrap a spawned call)
/// - `Detach`: the spawned strand between a detach and its continuation
/// - `Loop` / `Iteration`: a parallel loop and one of its iterations
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;

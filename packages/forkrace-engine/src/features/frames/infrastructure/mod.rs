pub mod frame_stack;
pub mod stack_ranges;

pub use frame_stack::FrameStack;
pub use stack_ranges::{StackRange, StackRanges};

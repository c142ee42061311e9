//! Stack address ranges of live frames
//!
//! The stack grows downwards: `high` is fixed when the frame is pushed and
//! `low` follows the lowest address the frame has been seen to touch.

use crate::errors::{DetectorError, Result};
use crate::shared::models::Address;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackRange {
    pub high: Address,
    pub low: Address,
}

impl StackRange {
    /// Byte length of `[low, high)`
    pub fn size(&self) -> usize {
        (self.high - self.low) as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct StackRanges {
    ranges: Vec<StackRange>,
}

impl StackRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, high: Address, low: Address) -> Result<()> {
        if low > high {
            return Err(DetectorError::model_violation(
                "push_stack_frame",
                format!("low {:#x} is above high {:#x}", low, high),
            ));
        }
        debug!(target: "forkrace::stack", "push stack frame [{:#x}, {:#x})", low, high);
        self.ranges.push(StackRange { high, low });
        Ok(())
    }

    /// Extend the current frame down to `addr`
    pub fn advance(&mut self, addr: Address) {
        if let Some(top) = self.ranges.last_mut() {
            if addr < top.low {
                top.low = addr;
            }
        }
    }

    pub fn pop(&mut self) -> Result<StackRange> {
        let range = self.ranges.pop().ok_or_else(|| {
            DetectorError::model_violation("pop_stack_frame", "no stack frame is pushed")
        })?;
        debug!(
            target: "forkrace::stack",
            "pop stack frame [{:#x}, {:#x})",
            range.low,
            range.high
        );
        Ok(range)
    }

    /// Stack pointer restored upwards to `addr`
    ///
    /// Returns the released range `[old low, addr)`, if any.
    pub fn restore(&mut self, addr: Address) -> Option<StackRange> {
        let top = self.ranges.last_mut()?;
        if addr <= top.low {
            return None;
        }
        let high = addr.min(top.high);
        let released = StackRange {
            high,
            low: top.low,
        };
        top.low = high;
        Some(released)
    }

    pub fn top(&self) -> Option<&StackRange> {
        self.ranges.last()
    }

    pub fn depth(&self) -> usize {
        self.ranges.len()
    }
}

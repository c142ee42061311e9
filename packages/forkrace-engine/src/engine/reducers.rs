//! Reducer hooks and view reconciliation
//!
//! A frame is "in continuation" between resuming after a spawn and becoming
//! locally synced again. Strands that run while some frame is in continuation
//! may be logically parallel with the accumulator's other users, so their
//! lookups are redirected to a private view owned by the innermost such frame.
//! When the frame leaves continuation its views are merged into the next
//! frame in continuation below it, or reduced into the leftmost views.

use super::detector::Detector;
use crate::errors::{DetectorError, Result};
use crate::features::reducers::{
    merge_tables, reduce_into_leftmost, ReducerOps, RetiredView, ViewEntry,
};
use crate::shared::models::{AccessKind, AccessProps, Address, InstrId, ReducerKey};
use std::sync::Arc;
use tracing::debug;

impl Detector {
    /// Register an accumulator whose leftmost view lives at `key`
    pub fn reducer_register(
        &mut self,
        id: InstrId,
        key: ReducerKey,
        size: usize,
        ops: Arc<dyn ReducerOps>,
    ) -> Result<()> {
        self.guard("reducer_register", |d| {
            if d.parallel_seen {
                let displaced = d
                    .frames
                    .innermost_continuation()
                    .and_then(|idx| d.frames.get_mut(idx))
                    .and_then(|frame| frame.views.insert(key, ViewEntry { view: key, size, ops }));
                if let Some(entry) = displaced.filter(|entry| !entry.is_leftmost(key)) {
                    d.retire_view(RetiredView {
                        view: entry.view,
                        size: entry.size,
                    });
                }
            }
            debug!(target: "forkrace::reducer", "register {:#x} ({} bytes) at {}", key, size, id);
            d.check_access(id, AccessKind::Read, key, 1, 0, AccessProps::plain())
        })
    }

    /// Unregister an accumulator; an outstanding private view is discarded
    pub fn reducer_unregister(&mut self, id: InstrId, key: ReducerKey) -> Result<()> {
        self.guard("reducer_unregister", |d| {
            if let Some(idx) = d.frames.innermost_continuation() {
                let removed = d.frames.get_mut(idx).and_then(|frame| frame.views.remove(key));
                if let Some(entry) = removed {
                    if !entry.is_leftmost(key) {
                        d.retire_view(RetiredView {
                            view: entry.view,
                            size: entry.size,
                        });
                    }
                }
            }
            debug!(target: "forkrace::reducer", "unregister {:#x} at {}", key, id);
            d.check_access(id, AccessKind::Read, key, 1, 0, AccessProps::plain())
        })
    }

    /// View of the accumulator `key` for the running strand
    ///
    /// Returns `key` itself while the strand owns the leftmost view; otherwise
    /// creates (once per continuation frame) a private view initialized with
    /// `ops.identity`.
    pub fn hyper_lookup(
        &mut self,
        id: InstrId,
        key: ReducerKey,
        size: usize,
        ops: Arc<dyn ReducerOps>,
    ) -> Result<Address> {
        self.guard("hyper_lookup", |d| {
            if !d.parallel_seen {
                return Ok(key);
            }
            let Some(idx) = d.frames.innermost_continuation() else {
                return Ok(key);
            };
            if let Some(entry) = d.frames.get(idx).and_then(|frame| frame.views.get(key)) {
                return Ok(entry.view);
            }

            let view = d
                .allocator
                .allocate(size)
                .ok_or_else(|| DetectorError::exhausted("reducer view allocation", size))?;
            d.shadow.clear_all(view, size);
            d.view_ranges.insert(view, size);
            ops.identity(view, size);
            if let Some(frame) = d.frames.get_mut(idx) {
                frame.views.insert(key, ViewEntry { view, size, ops });
            }
            debug!(
                target: "forkrace::reducer",
                "new view {:#x} of {:#x} for {} in frame {}",
                view,
                key,
                id,
                idx
            );
            Ok(view)
        })
    }

    /// Take frame `idx` out of continuation and reconcile its views
    pub(super) fn exit_continuation(&mut self, idx: usize) -> Result<()> {
        let Some(frame) = self.frames.get_mut(idx) else {
            return Ok(());
        };
        if !frame.in_continuation {
            return Ok(());
        }
        frame.in_continuation = false;
        let table = std::mem::take(&mut frame.views);
        if table.is_empty() {
            return Ok(());
        }

        let retired = match self.frames.continuation_below(idx) {
            Some(target) => {
                let Some(ancestor) = self.frames.get_mut(target) else {
                    return Ok(());
                };
                let left = std::mem::take(&mut ancestor.views);
                let outcome = merge_tables(left, table)?;
                ancestor.views = outcome.table;
                debug!(
                    target: "forkrace::reducer",
                    "merged views of frame {} into frame {}",
                    idx,
                    target
                );
                outcome.retired
            }
            None => {
                debug!(target: "forkrace::reducer", "reduced views of frame {} into leftmost", idx);
                reduce_into_leftmost(table)
            }
        };

        for view in retired {
            self.retire_view(view);
        }
        Ok(())
    }

    fn retire_view(&mut self, retired: RetiredView) {
        self.shadow.clear_all(retired.view, retired.size);
        self.view_ranges.remove(&retired.view);
        self.allocator.release(retired.view, retired.size);
    }
}

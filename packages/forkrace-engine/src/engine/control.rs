//! Control-flow hooks: calls, spawns, syncs and parallel loops
use super::detector::Detector;
use crate::errors::{DetectorError, Result};
use crate::features::frames::{FrameKind, Join};
use crate::shared::models::{CallKind, CallSite, InstrId, SyncRegionId};
use tracing::debug;

impl Detector {
    /// Entry of an ordinary (possibly spawning) function
    pub fn enter_function(&mut self, id: InstrId) -> Result<()> {
        self.guard("enter_function", |d| {
            d.frames.push(FrameKind::Function, id, &mut d.forest)
        })
    }

    /// Entry of a helper that wraps a spawned call
    pub fn enter_helper(&mut self, id: InstrId) -> Result<()> {
        self.guard("enter_helper", |d| {
            d.frames.push(FrameKind::Helper, id, &mut d.forest)
        })
    }

    /// Spawn point: the following code up to `detach_continue` is the child strand
    pub fn detach(&mut self, id: InstrId, region: SyncRegionId) -> Result<()> {
        self.guard("detach", |d| {
            d.parallel_seen = true;
            d.stats.end_strand();
            d.frames.push_detach(id, region, &mut d.forest)?;
            d.call_stack.push(CallSite::new(CallKind::Spawn, id));
            Ok(())
        })
    }

    /// Resumption of the continuation after the child of the innermost detach
    ///
    /// The child joins the parent's Parallel bag for `region`; ordering with
    /// the continuation is only established by the next sync.
    pub fn detach_continue(&mut self, id: InstrId, region: SyncRegionId) -> Result<()> {
        self.guard("detach_continue", |d| {
            let top = d.frames.top();
            if top.kind != FrameKind::Detach || top.detach_region != Some(region) {
                return Err(DetectorError::model_violation(
                    "detach_continue",
                    format!(
                        "{} at region {} does not close a detach (top frame is {} {})",
                        id,
                        region,
                        top.kind.as_str(),
                        top.entry
                    ),
                ));
            }

            d.frames.sync_all(&mut d.forest);
            d.exit_continuation(d.frames.depth() - 1)?;
            d.frames.pop(Join::Parallel(region), &mut d.forest)?;
            d.frames.top_mut().in_continuation = true;
            if d.call_stack.top().map(|site| site.kind) == Some(CallKind::Spawn) {
                d.call_stack.pop();
            }
            d.stats.end_strand();
            Ok(())
        })
    }

    /// Join all children spawned in `region` of the current frame
    pub fn sync(&mut self, id: InstrId, region: SyncRegionId) -> Result<()> {
        self.guard("sync", |d| {
            d.frames.sync(region, d.config.strict_sync, &mut d.forest)?;
            let top = d.frames.top();
            if top.kind != FrameKind::Loop && top.is_locally_synced() {
                d.exit_continuation(d.frames.depth() - 1)?;
            }
            debug!(target: "forkrace::frames", "sync {} region {}", id, region);
            d.stats.end_strand();
            Ok(())
        })
    }

    /// Return from a function whose spawns have all been synced
    pub fn function_return(&mut self, id: InstrId) -> Result<()> {
        self.guard("function_return", |d| {
            d.check_returnable("function_return", id)?;
            if !d.frames.top().is_locally_synced() {
                return Err(DetectorError::model_violation(
                    "function_return",
                    format!("{} returns with unsynced spawns", id),
                ));
            }
            d.exit_continuation(d.frames.depth() - 1)?;
            d.frames.pop(Join::Series, &mut d.forest)?;
            Ok(())
        })
    }

    /// Function exit with the implicit sync of every open region
    pub fn leave(&mut self, id: InstrId) -> Result<()> {
        self.guard("leave", |d| {
            d.check_returnable("leave", id)?;
            d.frames.sync_all(&mut d.forest);
            d.exit_continuation(d.frames.depth() - 1)?;
            d.frames.pop(Join::Series, &mut d.forest)?;
            Ok(())
        })
    }

    /// A parallel loop starts; its first iteration opens the loop frame
    pub fn loop_begin(&mut self, id: InstrId) -> Result<()> {
        self.guard("loop_begin", |d| {
            d.parallel_seen = true;
            d.frames.top_mut().start_new_loop = true;
            debug!(target: "forkrace::frames", "loop begin {}", id);
            Ok(())
        })
    }

    /// Start of one loop iteration, concurrent with all other iterations
    pub fn iteration_begin(&mut self, id: InstrId) -> Result<()> {
        self.guard("iteration_begin", |d| {
            if d.frames.top().start_new_loop {
                d.frames.top_mut().start_new_loop = false;
                d.frames.push(FrameKind::Loop, id, &mut d.forest)?;
            } else if d.frames.top().kind != FrameKind::Loop {
                return Err(DetectorError::model_violation(
                    "iteration_begin",
                    format!(
                        "{} is not inside a parallel loop (top frame is {})",
                        id,
                        d.frames.top().kind.as_str()
                    ),
                ));
            }
            d.stats.end_strand();
            d.frames.push(FrameKind::Iteration, id, &mut d.forest)?;
            d.call_stack.push(CallSite::new(CallKind::Loop, id));
            Ok(())
        })
    }

    /// End of one loop iteration
    pub fn iteration_end(&mut self, id: InstrId) -> Result<()> {
        self.guard("iteration_end", |d| {
            if d.frames.top().kind != FrameKind::Iteration {
                return Err(DetectorError::model_violation(
                    "iteration_end",
                    format!(
                        "{} without an open iteration (top frame is {})",
                        id,
                        d.frames.top().kind.as_str()
                    ),
                ));
            }
            d.frames.sync_all(&mut d.forest);
            d.exit_continuation(d.frames.depth() - 1)?;
            d.frames.pop(Join::Parallel(0), &mut d.forest)?;

            let loop_frame = d.frames.top_mut();
            loop_frame.region_mut(0).spawned = true;
            loop_frame.in_continuation = true;
            if d.call_stack.top().map(|site| site.kind) == Some(CallKind::Loop) {
                d.call_stack.pop();
            }
            d.stats.end_strand();
            Ok(())
        })
    }

    /// End of a parallel loop: all iterations are joined
    ///
    /// `region` is the enclosing frame's sync region that the loop counts as
    /// having spawned into.
    pub fn loop_end(&mut self, id: InstrId, region: SyncRegionId) -> Result<()> {
        self.guard("loop_end", |d| {
            if d.frames.top().start_new_loop {
                d.frames.top_mut().start_new_loop = false;
                return d.frames.mark_spawned(region);
            }
            if d.frames.top().kind != FrameKind::Loop {
                return Err(DetectorError::model_violation(
                    "loop_end",
                    format!(
                        "{} without an open loop (top frame is {})",
                        id,
                        d.frames.top().kind.as_str()
                    ),
                ));
            }
            d.frames.sync_all(&mut d.forest);
            d.exit_continuation(d.frames.depth() - 1)?;
            d.frames.pop(Join::Series, &mut d.forest)?;
            d.frames.mark_spawned(region)?;
            d.stats.end_strand();
            Ok(())
        })
    }

    /// Push a call site onto the reported call stack
    pub fn record_call(&mut self, id: InstrId, kind: CallKind) -> Result<()> {
        self.guard("record_call", |d| {
            d.call_stack.push(CallSite::new(kind, id));
            Ok(())
        })
    }

    /// Pop the call site pushed by the matching `record_call`
    pub fn record_call_return(&mut self, id: InstrId, kind: CallKind) -> Result<()> {
        self.guard("record_call_return", |d| {
            let site = CallSite::new(kind, id);
            if !d.call_stack.tail_matches(&site) {
                let top = d
                    .call_stack
                    .top()
                    .map(|top| format!("{} {}", top.kind.as_str(), top.id))
                    .unwrap_or_else(|| "empty".to_string());
                return Err(DetectorError::model_violation(
                    "record_call_return",
                    format!("return from {} {} but the call stack top is {}", kind.as_str(), id, top),
                ));
            }
            d.call_stack.pop();
            Ok(())
        })
    }

    fn check_returnable(&self, event: &'static str, id: InstrId) -> Result<()> {
        let top = self.frames.top();
        match top.kind {
            FrameKind::Function | FrameKind::Helper => Ok(()),
            kind => Err(DetectorError::model_violation(
                event,
                format!("{} cannot leave a {} frame", id, kind.as_str()),
            )),
        }
    }
}

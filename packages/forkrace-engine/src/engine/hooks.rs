//! Shim events
//!
//! Every hook of the instrumentation boundary as one closed enum, so a
//! recorded event trace can be replayed through `Detector::dispatch`.

use super::detector::Detector;
use crate::errors::Result;
use crate::features::reducers::ReducerOps;
use crate::shared::models::{
    AccessProps, Address, CallKind, InstrId, ReducerKey, SourceLocation, SyncRegionId,
};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub enum ShimEvent {
    EnterFunction { id: InstrId },
    EnterHelper { id: InstrId },
    Detach { id: InstrId, region: SyncRegionId },
    DetachContinue { id: InstrId, region: SyncRegionId },
    Sync { id: InstrId, region: SyncRegionId },
    FunctionReturn { id: InstrId },
    Leave { id: InstrId },
    LoopBegin { id: InstrId },
    IterationBegin { id: InstrId },
    IterationEnd { id: InstrId },
    LoopEnd { id: InstrId, region: SyncRegionId },
    RecordCall { id: InstrId, kind: CallKind },
    RecordCallReturn { id: InstrId, kind: CallKind },
    PushStackFrame { high: Address, low: Address },
    AdvanceStackFrame { addr: Address },
    PopStackFrame,
    RestoreStack { id: InstrId, addr: Address },
    Load {
        id: InstrId,
        addr: Address,
        size: usize,
        align: usize,
        props: AccessProps,
    },
    Store {
        id: InstrId,
        addr: Address,
        size: usize,
        align: usize,
        props: AccessProps,
    },
    Alloc { id: InstrId, addr: Address, size: usize },
    Free { id: InstrId, addr: Address },
    AcquireLock { lock: u64 },
    ReleaseLock { lock: u64 },
    ReducerRegister {
        id: InstrId,
        key: ReducerKey,
        size: usize,
        ops: Arc<dyn ReducerOps>,
    },
    ReducerUnregister { id: InstrId, key: ReducerKey },
    HyperLookup {
        id: InstrId,
        key: ReducerKey,
        size: usize,
        ops: Arc<dyn ReducerOps>,
    },
    DisableChecking,
    EnableChecking,
    RegisterSource { id: InstrId, location: SourceLocation },
}

impl ShimEvent {
    /// Hook name, as used in model-violation messages
    pub fn name(&self) -> &'static str {
        match self {
            ShimEvent::EnterFunction { .. } => "enter_function",
            ShimEvent::EnterHelper { .. } => "enter_helper",
            ShimEvent::Detach { .. } => "detach",
            ShimEvent::DetachContinue { .. } => "detach_continue",
            ShimEvent::Sync { .. } => "sync",
            ShimEvent::FunctionReturn { .. } => "function_return",
            ShimEvent::Leave { .. } => "leave",
            ShimEvent::LoopBegin { .. } => "loop_begin",
            ShimEvent::IterationBegin { .. } => "iteration_begin",
            ShimEvent::IterationEnd { .. } => "iteration_end",
            ShimEvent::LoopEnd { .. } => "loop_end",
            ShimEvent::RecordCall { .. } => "record_call",
            ShimEvent::RecordCallReturn { .. } => "record_call_return",
            ShimEvent::PushStackFrame { .. } => "push_stack_frame",
            ShimEvent::AdvanceStackFrame { .. } => "advance_stack_frame",
            ShimEvent::PopStackFrame => "pop_stack_frame",
            ShimEvent::RestoreStack { .. } => "restore_stack",
            ShimEvent::Load { .. } => "load",
            ShimEvent::Store { .. } => "store",
            ShimEvent::Alloc { .. } => "record_alloc",
            ShimEvent::Free { .. } => "record_free",
            ShimEvent::AcquireLock { .. } => "acquire_lock",
            ShimEvent::ReleaseLock { .. } => "release_lock",
            ShimEvent::ReducerRegister { .. } => "reducer_register",
            ShimEvent::ReducerUnregister { .. } => "reducer_unregister",
            ShimEvent::HyperLookup { .. } => "hyper_lookup",
            ShimEvent::DisableChecking => "disable_checking",
            ShimEvent::EnableChecking => "enable_checking",
            ShimEvent::RegisterSource { .. } => "register_source",
        }
    }
}

impl fmt::Debug for ShimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShimEvent::Load { id, addr, size, .. } | ShimEvent::Store { id, addr, size, .. } => {
                write!(f, "{}({}, {:#x}+{})", self.name(), id, addr, size)
            }
            ShimEvent::Detach { id, region }
            | ShimEvent::DetachContinue { id, region }
            | ShimEvent::Sync { id, region }
            | ShimEvent::LoopEnd { id, region } => {
                write!(f, "{}({}, region {})", self.name(), id, region)
            }
            _ => f.write_str(self.name()),
        }
    }
}

impl Detector {
    /// Route an event to its hook
    ///
    /// Returns the view address for `HyperLookup` and `None` otherwise.
    pub fn dispatch(&mut self, event: ShimEvent) -> Result<Option<Address>> {
        match event {
            ShimEvent::EnterFunction { id } => self.enter_function(id)?,
            ShimEvent::EnterHelper { id } => self.enter_helper(id)?,
            ShimEvent::Detach { id, region } => self.detach(id, region)?,
            ShimEvent::DetachContinue { id, region } => self.detach_continue(id, region)?,
            ShimEvent::Sync { id, region } => self.sync(id, region)?,
            ShimEvent::FunctionReturn { id } => self.function_return(id)?,
            ShimEvent::Leave { id } => self.leave(id)?,
            ShimEvent::LoopBegin { id } => self.loop_begin(id)?,
            ShimEvent::IterationBegin { id } => self.iteration_begin(id)?,
            ShimEvent::IterationEnd { id } => self.iteration_end(id)?,
            ShimEvent::LoopEnd { id, region } => self.loop_end(id, region)?,
            ShimEvent::RecordCall { id, kind } => self.record_call(id, kind)?,
            ShimEvent::RecordCallReturn { id, kind } => self.record_call_return(id, kind)?,
            ShimEvent::PushStackFrame { high, low } => self.push_stack_frame(high, low)?,
            ShimEvent::AdvanceStackFrame { addr } => self.advance_stack_frame(addr)?,
            ShimEvent::PopStackFrame => self.pop_stack_frame()?,
            ShimEvent::RestoreStack { id, addr } => self.restore_stack(id, addr)?,
            ShimEvent::Load {
                id,
                addr,
                size,
                align,
                props,
            } => self.load(id, addr, size, align, props)?,
            ShimEvent::Store {
                id,
                addr,
                size,
                align,
                props,
            } => self.store(id, addr, size, align, props)?,
            ShimEvent::Alloc { id, addr, size } => self.record_alloc(id, addr, size)?,
            ShimEvent::Free { id, addr } => self.record_free(id, addr)?,
            ShimEvent::AcquireLock { lock } => self.acquire_lock(lock)?,
            ShimEvent::ReleaseLock { lock } => self.release_lock(lock)?,
            ShimEvent::ReducerRegister { id, key, size, ops } => {
                self.reducer_register(id, key, size, ops)?
            }
            ShimEvent::ReducerUnregister { id, key } => self.reducer_unregister(id, key)?,
            ShimEvent::HyperLookup { id, key, size, ops } => {
                return self.hyper_lookup(id, key, size, ops).map(Some)
            }
            ShimEvent::DisableChecking => self.disable_checking()?,
            ShimEvent::EnableChecking => self.enable_checking()?,
            ShimEvent::RegisterSource { id, location } => self.register_source(id, location),
        }
        Ok(None)
    }

    /// Dispatch a sequence of events, stopping at the first error
    pub fn replay(&mut self, events: impl IntoIterator<Item = ShimEvent>) -> Result<()> {
        for event in events {
            self.dispatch(event)?;
        }
        Ok(())
    }
}

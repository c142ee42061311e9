//! Builder for scripted shim event traces
use forkrace_engine::{AccessProps, Address, CallKind, InstrId, ShimEvent, SyncRegionId};

/// Records the hook sequence an instrumented program would emit
///
/// Structured helpers (`spawn`, `call`, `parallel_for`, ...) always emit
/// balanced enter/exit pairs; the raw `event` escape hatch does not.
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    events: Vec<ShimEvent>,
}

pub fn id(raw: u64) -> InstrId {
    InstrId::new(raw)
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(&mut self, event: ShimEvent) -> &mut Self {
        self.events.push(event);
        self
    }

    pub fn write(&mut self, instr: u64, addr: Address, size: usize) -> &mut Self {
        self.write_with(instr, addr, size, AccessProps::plain())
    }

    pub fn write_with(
        &mut self,
        instr: u64,
        addr: Address,
        size: usize,
        props: AccessProps,
    ) -> &mut Self {
        self.event(ShimEvent::Store {
            id: id(instr),
            addr,
            size,
            align: 0,
            props,
        })
    }

    pub fn read(&mut self, instr: u64, addr: Address, size: usize) -> &mut Self {
        self.read_with(instr, addr, size, AccessProps::plain())
    }

    pub fn read_with(
        &mut self,
        instr: u64,
        addr: Address,
        size: usize,
        props: AccessProps,
    ) -> &mut Self {
        self.event(ShimEvent::Load {
            id: id(instr),
            addr,
            size,
            align: 0,
            props,
        })
    }

    /// Spawn `child` into `region`; the continuation follows this call
    pub fn spawn(
        &mut self,
        instr: u64,
        region: SyncRegionId,
        child: impl FnOnce(&mut Self),
    ) -> &mut Self {
        self.event(ShimEvent::Detach {
            id: id(instr),
            region,
        });
        child(self);
        self.event(ShimEvent::DetachContinue {
            id: id(instr),
            region,
        })
    }

    pub fn sync(&mut self, instr: u64, region: SyncRegionId) -> &mut Self {
        self.event(ShimEvent::Sync {
            id: id(instr),
            region,
        })
    }

    /// Ordinary call: the callee completes before the caller resumes
    pub fn call(&mut self, instr: u64, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.event(ShimEvent::RecordCall {
            id: id(instr),
            kind: CallKind::Call,
        });
        self.event(ShimEvent::EnterFunction { id: id(instr) });
        body(self);
        self.event(ShimEvent::Leave { id: id(instr) });
        self.event(ShimEvent::RecordCallReturn {
            id: id(instr),
            kind: CallKind::Call,
        })
    }

    /// Parallel loop of `iterations`, joined into `region` of the enclosing frame
    pub fn parallel_for(
        &mut self,
        instr: u64,
        region: SyncRegionId,
        iterations: usize,
        mut body: impl FnMut(&mut Self, usize),
    ) -> &mut Self {
        self.event(ShimEvent::LoopBegin { id: id(instr) });
        for i in 0..iterations {
            self.event(ShimEvent::IterationBegin { id: id(instr) });
            body(self, i);
            self.event(ShimEvent::IterationEnd { id: id(instr) });
        }
        self.event(ShimEvent::LoopEnd {
            id: id(instr),
            region,
        })
    }

    pub fn locked(&mut self, lock: u64, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.event(ShimEvent::AcquireLock { lock });
        body(self);
        self.event(ShimEvent::ReleaseLock { lock })
    }

    /// Stack frame spanning `[low, high)` for the duration of `body`
    pub fn stack_frame(
        &mut self,
        high: Address,
        low: Address,
        body: impl FnOnce(&mut Self),
    ) -> &mut Self {
        self.event(ShimEvent::PushStackFrame { high, low });
        body(self);
        self.event(ShimEvent::PopStackFrame)
    }

    pub fn alloc(&mut self, instr: u64, addr: Address, size: usize) -> &mut Self {
        self.event(ShimEvent::Alloc {
            id: id(instr),
            addr,
            size,
        })
    }

    pub fn free(&mut self, instr: u64, addr: Address) -> &mut Self {
        self.event(ShimEvent::Free { id: id(instr), addr })
    }

    pub fn build(&mut self) -> Vec<ShimEvent> {
        std::mem::take(&mut self.events)
    }
}

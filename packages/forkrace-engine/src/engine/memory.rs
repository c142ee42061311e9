//! Memory hooks: loads, stores, allocation, stack ranges and locks
use super::detector::Detector;
use crate::errors::{DetectorError, Result};
use crate::features::locksets::LockSnapshot;
use crate::features::race_report::{AllocContext, RaceRecord};
use crate::features::shadow_memory::{AccessRecord, MemoryEvent, RaceCandidate};
use crate::shared::models::{
    AccessKind, AccessLoc, AccessProps, Address, AllocKind, InstrId, LockId,
};
use tracing::{debug, warn};

impl Detector {
    /// Instrumented load
    pub fn load(
        &mut self,
        id: InstrId,
        addr: Address,
        size: usize,
        align: usize,
        props: AccessProps,
    ) -> Result<()> {
        self.guard("load", |d| {
            d.check_access(id, AccessKind::Read, addr, size, align, props)
        })
    }

    /// Instrumented store
    pub fn store(
        &mut self,
        id: InstrId,
        addr: Address,
        size: usize,
        align: usize,
        props: AccessProps,
    ) -> Result<()> {
        self.guard("store", |d| {
            d.check_access(id, AccessKind::Write, addr, size, align, props)
        })
    }

    /// Heap allocation of `[addr, addr + size)`
    pub fn record_alloc(&mut self, id: InstrId, addr: Address, size: usize) -> Result<()> {
        self.guard("record_alloc", |d| {
            d.heap.insert(addr, size);
            let record = d.access_record(id, AccessKind::Alloc, addr, size, d.locks.snapshot());
            d.apply(
                MemoryEvent::Alloc {
                    addr,
                    size,
                    origin: AllocKind::Heap,
                },
                record,
            )
        })
    }

    /// Heap free; the size comes from the matching allocation
    pub fn record_free(&mut self, id: InstrId, addr: Address) -> Result<()> {
        self.guard("record_free", |d| {
            let Some(size) = d.heap.remove(addr) else {
                debug!(target: "forkrace::shadow", "free of untracked address {:#x} ignored", addr);
                return Ok(());
            };
            d.free_range(id, addr, size, AllocKind::Heap)
        })
    }

    /// A new stack frame spans `[low, high)`
    pub fn push_stack_frame(&mut self, high: Address, low: Address) -> Result<()> {
        self.guard("push_stack_frame", |d| d.stack_ranges.push(high, low))
    }

    /// The current stack frame has grown down to `addr`
    pub fn advance_stack_frame(&mut self, addr: Address) -> Result<()> {
        self.guard("advance_stack_frame", |d| {
            d.stack_ranges.advance(addr);
            Ok(())
        })
    }

    /// Pop the current stack frame and forget everything recorded in it
    pub fn pop_stack_frame(&mut self) -> Result<()> {
        self.guard("pop_stack_frame", |d| {
            let range = d.stack_ranges.pop()?;
            d.shadow.clear_all(range.low, range.size());
            Ok(())
        })
    }

    /// Stack pointer restored upwards to `addr`, releasing the memory below it
    pub fn restore_stack(&mut self, id: InstrId, addr: Address) -> Result<()> {
        self.guard("restore_stack", |d| match d.stack_ranges.restore(addr) {
            Some(released) if released.size() > 0 => {
                d.free_range(id, released.low, released.size(), AllocKind::Stack)
            }
            _ => Ok(()),
        })
    }

    pub fn acquire_lock(&mut self, lock: u64) -> Result<()> {
        self.guard("acquire_lock", |d| {
            d.locks.acquire(LockId::Mutex(lock));
            Ok(())
        })
    }

    pub fn release_lock(&mut self, lock: u64) -> Result<()> {
        self.guard("release_lock", |d| d.locks.release(LockId::Mutex(lock)))
    }

    /// Check and record a load or store
    pub(super) fn check_access(
        &mut self,
        id: InstrId,
        kind: AccessKind,
        addr: Address,
        size: usize,
        align: usize,
        props: AccessProps,
    ) -> Result<()> {
        if align != 0 && !align.is_power_of_two() {
            return Err(DetectorError::model_violation(
                "access",
                format!("{} has alignment {} which is not a power of two", id, align),
            ));
        }
        if self.checking_disabled > 0 || size == 0 {
            return Ok(());
        }
        if props.on_stack {
            self.stack_ranges.advance(addr);
        }
        if !self.parallel_seen || props.is_uncheckable(kind) {
            return Ok(());
        }

        let locks = if props.is_atomic {
            if !self.config.check_atomics {
                return Ok(());
            }
            self.locks.snapshot_with(LockId::for_atomic(addr))
        } else {
            self.locks.snapshot()
        };

        if kind.is_read() {
            self.stats.record_read(size);
        } else {
            self.stats.record_write(size);
        }
        hot_trace!(target: "forkrace::shadow", "{} {} {:#x}+{}", kind, id, addr, size);

        let record = self.access_record(id, kind, addr, size, locks);
        let event = if kind.is_read() {
            MemoryEvent::Read { addr, size }
        } else {
            MemoryEvent::Write { addr, size }
        };
        self.apply(event, record)
    }

    /// Check a free as a write, then forget the range and stamp the free
    fn free_range(
        &mut self,
        id: InstrId,
        addr: Address,
        size: usize,
        origin: AllocKind,
    ) -> Result<()> {
        if self.checking_disabled > 0 {
            self.shadow.clear_all(addr, size);
            return Ok(());
        }
        let record = self.access_record(id, AccessKind::Free, addr, size, self.locks.snapshot());
        self.apply(MemoryEvent::Free { addr, size, origin }, record)
    }

    fn access_record(
        &self,
        id: InstrId,
        kind: AccessKind,
        addr: Address,
        size: usize,
        locks: LockSnapshot,
    ) -> AccessRecord {
        AccessRecord {
            bag: self.frames.current_bag(),
            loc: AccessLoc::new(id, kind, self.call_stack.clone()),
            locks,
            via_view: self.in_view(addr, size),
        }
    }

    /// `[addr, addr + size)` overlaps a live private reducer view
    pub(super) fn in_view(&self, addr: Address, size: usize) -> bool {
        let end = addr.saturating_add(size.max(1) as u64);
        self.view_ranges
            .range(..end)
            .next_back()
            .map(|(&start, &len)| addr < start.saturating_add(len as u64))
            .unwrap_or(false)
    }

    /// Apply an event to shadow memory and log the races it reveals
    fn apply(&mut self, event: MemoryEvent, record: AccessRecord) -> Result<()> {
        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.clear();
        let current = record.loc.clone();

        let applied = self
            .shadow
            .apply(event, record, &mut self.forest, &mut candidates);
        let outcome = applied.and_then(|()| {
            let mut pause = None;
            for candidate in &candidates {
                if let Some(err) = self.log_race(candidate.prior.loc.clone(), &current, candidate) {
                    pause.get_or_insert(err);
                }
            }
            pause.map_or(Ok(()), Err)
        });

        self.candidates = candidates;
        outcome
    }

    /// Record one race; returns the pause error if this is the race to stop at
    fn log_race(
        &mut self,
        first: AccessLoc,
        second: &AccessLoc,
        candidate: &RaceCandidate,
    ) -> Option<DetectorError> {
        let alloc = self
            .shadow
            .alloc_stamp(candidate.addr)
            .filter(|stamp| stamp.record.loc.id != second.id && stamp.record.loc.id != first.id)
            .map(|stamp| AllocContext {
                loc: stamp.record.loc.clone(),
                origin: stamp.origin,
            });
        let record = RaceRecord {
            kind: candidate.kind,
            first,
            second: second.clone(),
            addr: candidate.addr,
            alloc,
        };
        let (first_id, second_id) = (record.first.id, record.second.id);
        if !self.races.insert(record) {
            return None;
        }

        warn!(
            target: "forkrace::report",
            "{} race between {} and {} at {:#x}",
            candidate.kind,
            first_id,
            second_id,
            candidate.addr
        );
        if self.config.pause_on_race && !self.paused {
            self.paused = true;
            return Some(DetectorError::PausedOnRace {
                first: first_id,
                second: second_id,
                addr: candidate.addr,
            });
        }
        None
    }
}

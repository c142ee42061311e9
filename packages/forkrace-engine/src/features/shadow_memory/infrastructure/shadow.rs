//! Shadow memory: last reader, last writer and allocation stamp per byte
use super::line_table::LineTable;
use crate::errors::Result;
use crate::features::race_report::RaceKind;
use crate::features::shadow_memory::domain::{
    range_end, AccessRecord, AllocStamp, MemoryEvent, RaceCandidate,
};
use crate::features::sp_bags::BagForest;
use crate::shared::models::Address;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ShadowMemory {
    readers: LineTable<Arc<AccessRecord>>,
    writers: LineTable<Arc<AccessRecord>>,
    allocs: LineTable<AllocStamp>,
}

impl Default for ShadowMemory {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ShadowMemory {
    /// `max_lines` caps each of the three tables (0 = unlimited)
    pub fn new(max_lines: usize) -> Self {
        Self {
            readers: LineTable::new("shadow readers", max_lines),
            writers: LineTable::new("shadow writers", max_lines),
            allocs: LineTable::new("shadow allocations", max_lines),
        }
    }

    /// Check `event` against the existing records, then record it
    ///
    /// Races are appended to `races`, at most one per earlier instruction.
    pub fn apply(
        &mut self,
        event: MemoryEvent,
        record: AccessRecord,
        forest: &mut BagForest,
        races: &mut Vec<RaceCandidate>,
    ) -> Result<()> {
        let record = Arc::new(record);
        match event {
            MemoryEvent::Read { addr, size } => {
                self.check_read(addr, size, &record, forest, races);
                self.record_read(addr, size, &record, forest)
            }
            MemoryEvent::Write { addr, size } => {
                self.check_write(addr, size, &record, forest, races);
                self.writers.set_range(addr, size, &record)
            }
            MemoryEvent::Free { addr, size, origin } => {
                self.check_write(addr, size, &record, forest, races);
                self.clear(addr, size);
                self.allocs.set_range(addr, size, &AllocStamp { record, origin })
            }
            MemoryEvent::Alloc { addr, size, origin } => {
                self.clear(addr, size);
                self.allocs.set_range(addr, size, &AllocStamp { record, origin })
            }
        }
    }

    /// Drop reader and writer records of a range
    pub fn clear(&mut self, addr: Address, size: usize) {
        self.readers.clear_range(addr, size);
        self.writers.clear_range(addr, size);
    }

    /// Drop reader, writer and allocation records of a range
    pub fn clear_all(&mut self, addr: Address, size: usize) {
        self.clear(addr, size);
        self.allocs.clear_range(addr, size);
    }

    /// Allocation or free event that last covered `addr`
    pub fn alloc_stamp(&self, addr: Address) -> Option<&AllocStamp> {
        self.allocs.get(addr)
    }

    pub fn reader(&self, addr: Address) -> Option<&Arc<AccessRecord>> {
        self.readers.get(addr)
    }

    pub fn writer(&self, addr: Address) -> Option<&Arc<AccessRecord>> {
        self.writers.get(addr)
    }

    /// Total allocated lines across the three tables
    pub fn line_count(&self) -> usize {
        self.readers.len() + self.writers.len() + self.allocs.len()
    }

    fn check_read(
        &self,
        addr: Address,
        size: usize,
        current: &AccessRecord,
        forest: &mut BagForest,
        races: &mut Vec<RaceCandidate>,
    ) {
        for byte in addr..range_end(addr, size) {
            if let Some(writer) = self.writers.get(byte) {
                consider(writer, byte, current, forest, races);
            }
            if let Some(stamp) = self.allocs.get(byte).filter(|s| s.is_free()) {
                consider(&stamp.record, byte, current, forest, races);
            }
        }
    }

    fn check_write(
        &self,
        addr: Address,
        size: usize,
        current: &AccessRecord,
        forest: &mut BagForest,
        races: &mut Vec<RaceCandidate>,
    ) {
        for byte in addr..range_end(addr, size) {
            if let Some(reader) = self.readers.get(byte) {
                consider(reader, byte, current, forest, races);
            }
            if let Some(writer) = self.writers.get(byte) {
                consider(writer, byte, current, forest, races);
            }
            if let Some(stamp) = self.allocs.get(byte).filter(|s| s.is_free()) {
                consider(&stamp.record, byte, current, forest, races);
            }
        }
    }

    /// A reader is only replaced when it is ordered before the current strand;
    /// a parallel reader is kept so later writes still see it.
    fn record_read(
        &mut self,
        addr: Address,
        size: usize,
        record: &Arc<AccessRecord>,
        forest: &mut BagForest,
    ) -> Result<()> {
        for byte in addr..range_end(addr, size) {
            let replace = match self.readers.get(byte) {
                Some(reader) => !forest.is_parallel(reader.bag),
                None => true,
            };
            if replace {
                self.readers.set(byte, Arc::clone(record))?;
            }
        }
        Ok(())
    }
}

fn consider(
    prior: &Arc<AccessRecord>,
    addr: Address,
    current: &AccessRecord,
    forest: &mut BagForest,
    races: &mut Vec<RaceCandidate>,
) {
    let Some(kind) = RaceKind::classify(prior.loc.kind, current.loc.kind) else {
        return;
    };
    if prior.via_view || prior.locks.intersects(&current.locks) {
        return;
    }
    if races.iter().any(|race| race.prior.loc.id == prior.loc.id) {
        return;
    }
    if !forest.is_parallel(prior.bag) {
        return;
    }
    races.push(RaceCandidate {
        prior: Arc::clone(prior),
        kind,
        addr,
    });
}

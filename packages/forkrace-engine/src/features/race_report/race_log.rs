//! Race accumulation and deduplication
//!
//! Races are bucketed by the larger of their two instruction ids. Within a
//! bucket two records are the same race iff their unordered instruction pairs
//! match, regardless of address or which access ran first.

use super::types::RaceRecord;
use crate::shared::models::InstrId;
use rustc_hash::FxHashMap;

/// A distinct race and how many times it was seen again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceEntry {
    pub record: RaceRecord,
    pub duplicates: u64,
}

/// Deduplicating race log, in discovery order
#[derive(Debug, Clone, Default)]
pub struct RaceLog {
    entries: Vec<RaceEntry>,
    buckets: FxHashMap<InstrId, Vec<usize>>,
    duplicates: u64,
}

impl RaceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a race; returns `true` if it is a new distinct race
    pub fn insert(&mut self, record: RaceRecord) -> bool {
        let bucket = self.buckets.entry(record.bucket()).or_default();
        for &idx in bucket.iter() {
            let entry = &mut self.entries[idx];
            if entry.record.same_race(&record) {
                entry.duplicates += 1;
                self.duplicates += 1;
                return false;
            }
        }

        bucket.push(self.entries.len());
        self.entries.push(RaceEntry {
            record,
            duplicates: 0,
        });
        true
    }

    /// Number of distinct races
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    /// Number of suppressed duplicate reports
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RaceEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RaceEntry> {
        self.entries.iter()
    }
}

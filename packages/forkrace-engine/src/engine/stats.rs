//! Engine statistics
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Counters collected when `collect_stats` is enabled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Strands completed (spawned children, continuations, iterations)
    pub strands: u64,
    pub reads_checked: u64,
    pub writes_checked: u64,
    /// Access size in bytes -> count
    pub reads_by_size: BTreeMap<usize, u64>,
    pub writes_by_size: BTreeMap<usize, u64>,
    pub max_reads_per_strand: u64,
    pub max_writes_per_strand: u64,
    /// Bags ever created
    pub bags: usize,
    /// Allocated shadow lines across all tables
    pub shadow_lines: usize,
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strands: {}", self.strands)?;
        writeln!(
            f,
            "Reads checked: {} (max {} per strand)",
            self.reads_checked, self.max_reads_per_strand
        )?;
        for (size, count) in &self.reads_by_size {
            writeln!(f, "  {}-byte reads: {}", size, count)?;
        }
        writeln!(
            f,
            "Writes checked: {} (max {} per strand)",
            self.writes_checked, self.max_writes_per_strand
        )?;
        for (size, count) in &self.writes_by_size {
            writeln!(f, "  {}-byte writes: {}", size, count)?;
        }
        writeln!(f, "Bags: {}", self.bags)?;
        writeln!(f, "Shadow lines: {}", self.shadow_lines)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StatsCollector {
    enabled: bool,
    stats: EngineStats,
    strand_reads: u64,
    strand_writes: u64,
}

impl StatsCollector {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub(crate) fn record_read(&mut self, size: usize) {
        if self.enabled {
            self.stats.reads_checked += 1;
            *self.stats.reads_by_size.entry(size).or_insert(0) += 1;
            self.strand_reads += 1;
        }
    }

    #[inline]
    pub(crate) fn record_write(&mut self, size: usize) {
        if self.enabled {
            self.stats.writes_checked += 1;
            *self.stats.writes_by_size.entry(size).or_insert(0) += 1;
            self.strand_writes += 1;
        }
    }

    pub(crate) fn end_strand(&mut self) {
        if !self.enabled {
            return;
        }
        self.stats.strands += 1;
        self.stats.max_reads_per_strand = self.stats.max_reads_per_strand.max(self.strand_reads);
        self.stats.max_writes_per_strand =
            self.stats.max_writes_per_strand.max(self.strand_writes);
        self.strand_reads = 0;
        self.strand_writes = 0;
    }

    pub(crate) fn snapshot(&self, bags: usize, shadow_lines: usize) -> EngineStats {
        EngineStats {
            max_reads_per_strand: self.stats.max_reads_per_strand.max(self.strand_reads),
            max_writes_per_strand: self.stats.max_writes_per_strand.max(self.strand_writes),
            bags,
            shadow_lines,
            ..self.stats.clone()
        }
    }
}

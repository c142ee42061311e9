//! Detector context
//!
//! One `Detector` observes one run of the instrumented program. It is created
//! by the embedding shim (`Detector::new`), fed every hook in program order
//! from a single worker, and torn down with `finish`, which emits the report.
//!
//! A fatal error poisons the detector: every later hook fails with a model
//! violation naming the original failure.

use super::stats::{EngineStats, StatsCollector};
use crate::config::{DetectorConfig, ReportFormat, ReportTarget, Validatable};
use crate::errors::{DetectorError, Result};
use crate::features::frames::{FrameStack, StackRanges};
use crate::features::locksets::LockSet;
use crate::features::race_report::{RaceLog, RaceSummary, ReportWriter};
use crate::features::reducers::ViewAllocator;
use crate::features::shadow_memory::{HeapMap, RaceCandidate, ShadowMemory};
use crate::features::sp_bags::BagForest;
use crate::shared::models::{Address, CallStack, InstrId, SourceLocation, SourceTable};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Lifecycle {
    Running,
    Poisoned(String),
    Finished,
}

/// Race detector for one run of a fork-join program
pub struct Detector {
    pub(super) config: DetectorConfig,
    pub(super) forest: BagForest,
    pub(super) frames: FrameStack,
    pub(super) stack_ranges: StackRanges,
    pub(super) shadow: ShadowMemory,
    pub(super) heap: HeapMap,
    pub(super) locks: LockSet,
    pub(super) call_stack: CallStack,
    pub(super) races: RaceLog,
    pub(super) sources: SourceTable,
    pub(super) allocator: Box<dyn ViewAllocator>,
    /// Live private reducer views: start -> size
    pub(super) view_ranges: BTreeMap<Address, usize>,
    /// Scratch buffer for the access path
    pub(super) candidates: Vec<RaceCandidate>,
    pub(super) stats: StatsCollector,
    /// A spawn or parallel loop has been observed
    pub(super) parallel_seen: bool,
    /// Nesting depth of `disable_checking`
    pub(super) checking_disabled: u32,
    /// `PausedOnRace` has already been returned
    pub(super) paused: bool,
    pub(super) lifecycle: Lifecycle,
}

impl Detector {
    /// Create a detector with only the root frame
    pub fn new(config: DetectorConfig, allocator: Box<dyn ViewAllocator>) -> Result<Self> {
        config.validate()?;
        let mut forest = BagForest::new(config.limits.max_bags);
        let frames = FrameStack::new(&mut forest, config.limits.max_sync_regions)?;
        info!(
            "forkrace detector initialized (check_atomics={}, strict_sync={}, pause_on_race={})",
            config.check_atomics, config.strict_sync, config.pause_on_race
        );

        Ok(Self {
            shadow: ShadowMemory::new(config.limits.max_shadow_lines),
            stats: StatsCollector::new(config.collect_stats),
            config,
            forest,
            frames,
            stack_ranges: StackRanges::new(),
            heap: HeapMap::new(),
            locks: LockSet::new(),
            call_stack: CallStack::new(),
            races: RaceLog::new(),
            sources: SourceTable::new(),
            allocator,
            view_ranges: BTreeMap::new(),
            candidates: Vec::new(),
            parallel_seen: false,
            checking_disabled: 0,
            paused: false,
            lifecycle: Lifecycle::Running,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Races recorded so far
    pub fn race_log(&self) -> &RaceLog {
        &self.races
    }

    /// True once at least one distinct race has been recorded
    pub fn races_found(&self) -> bool {
        !self.races.is_empty()
    }

    /// Current call stack
    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// Number of open frames, including the root
    pub fn frame_depth(&self) -> usize {
        self.frames.depth()
    }

    pub fn is_finished(&self) -> bool {
        self.lifecycle == Lifecycle::Finished
    }

    /// Statistics, if `collect_stats` is enabled
    pub fn stats(&self) -> Option<EngineStats> {
        self.stats
            .is_enabled()
            .then(|| self.stats.snapshot(self.forest.len(), self.shadow.line_count()))
    }

    /// Attach a source location to an instruction id for reports
    pub fn register_source(&mut self, id: InstrId, location: SourceLocation) {
        self.sources.register(id, location);
    }

    /// Suspend memory checking; calls nest
    pub fn disable_checking(&mut self) -> Result<()> {
        self.guard("disable_checking", |d| {
            d.checking_disabled += 1;
            Ok(())
        })
    }

    pub fn enable_checking(&mut self) -> Result<()> {
        self.guard("enable_checking", |d| {
            d.checking_disabled = d.checking_disabled.checked_sub(1).ok_or_else(|| {
                DetectorError::model_violation("enable_checking", "checking is not disabled")
            })?;
            Ok(())
        })
    }

    /// End of the run
    ///
    /// Requires every frame but the root to be closed. Performs the root's
    /// implicit sync, folds outstanding reducer views into their leftmost
    /// views, writes the report and returns the summary.
    pub fn finish(&mut self) -> Result<RaceSummary> {
        self.guard("finish", |d| {
            if d.frames.depth() != 1 {
                return Err(DetectorError::model_violation(
                    "finish",
                    format!("{} frames are still open", d.frames.depth() - 1),
                ));
            }
            d.frames.sync_all(&mut d.forest);
            d.exit_continuation(0)?;
            d.stats.end_strand();
            d.lifecycle = Lifecycle::Finished;

            let summary = RaceSummary::from_log(&d.races);
            info!(
                "forkrace finished: {} distinct races, {} duplicates",
                summary.distinct_races, summary.duplicate_races
            );
            d.emit_report(&summary)?;
            Ok(summary)
        })
    }

    /// Run `f` unless the detector is finished or poisoned; poison on fatal errors
    pub(super) fn guard<T>(
        &mut self,
        event: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        match &self.lifecycle {
            Lifecycle::Running => {}
            Lifecycle::Finished => {
                return Err(DetectorError::model_violation(
                    event,
                    "event after the detector finished",
                ))
            }
            Lifecycle::Poisoned(cause) => {
                return Err(DetectorError::model_violation(
                    event,
                    format!("detector stopped after an earlier failure: {}", cause),
                ))
            }
        }

        let result = f(self);
        if let Err(err) = &result {
            if err.is_fatal() {
                error!("{}", err);
                self.lifecycle = Lifecycle::Poisoned(err.to_string());
            }
        }
        result
    }

    /// Render the report and write it to the configured destination
    pub fn render_report(&self, summary: &RaceSummary) -> Result<String> {
        let report = &self.config.report;
        let writer = ReportWriter::new(&self.sources, report.color, report.max_stack_depth);
        let mut body = match report.format {
            ReportFormat::Text => writer.render_text(summary),
            ReportFormat::Json => writer.render_json(summary).map_err(std::io::Error::from)?,
        };
        if report.format == ReportFormat::Text {
            if let Some(stats) = self.stats() {
                body.push_str(&stats.to_string());
            }
        }
        Ok(body)
    }

    fn emit_report(&self, summary: &RaceSummary) -> Result<()> {
        let body = self.render_report(summary)?;
        match self.config.report.destination {
            ReportTarget::Stderr => std::io::stderr().write_all(body.as_bytes())?,
            ReportTarget::Stdout => std::io::stdout().write_all(body.as_bytes())?,
            ReportTarget::File => {
                if let Some(path) = &self.config.report.path {
                    std::fs::write(path, body)?;
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("frames", &self.frames.depth())
            .field("bags", &self.forest.len())
            .field("races", &self.races.distinct())
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

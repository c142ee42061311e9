//! Race report rendering
//!
//! Text output follows the layout users of fork-join race detectors expect:
//! a headline per race, both accesses with their call stacks, the allocation
//! context if one is known, then the distinct/duplicate totals. The JSON form
//! carries the same data.

use super::race_log::{RaceEntry, RaceLog};
use super::types::AllocContext;
use crate::shared::models::{AccessLoc, SourceTable};
use serde::Serialize;
use std::fmt::Write as _;

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Final race counts plus the distinct races themselves
#[derive(Debug, Clone, Default)]
pub struct RaceSummary {
    pub distinct_races: usize,
    pub duplicate_races: u64,
    pub races: Vec<RaceEntry>,
}

impl RaceSummary {
    pub fn from_log(log: &RaceLog) -> Self {
        Self {
            distinct_races: log.distinct(),
            duplicate_races: log.duplicates(),
            races: log.entries().to_vec(),
        }
    }

    /// The run's success criterion: any distinct race is a failure
    pub fn has_races(&self) -> bool {
        self.distinct_races > 0
    }
}

/// Renders a race log for humans or tools
#[derive(Debug, Clone)]
pub struct ReportWriter<'a> {
    sources: &'a SourceTable,
    color: bool,
    max_stack_depth: usize,
}

impl<'a> ReportWriter<'a> {
    pub fn new(sources: &'a SourceTable, color: bool, max_stack_depth: usize) -> Self {
        Self {
            sources,
            color,
            max_stack_depth,
        }
    }

    /// Render the human-readable report
    pub fn render_text(&self, summary: &RaceSummary) -> String {
        let mut out = String::new();
        for entry in &summary.races {
            self.write_race(&mut out, entry);
        }
        let _ = writeln!(out, "Detected {} distinct races.", summary.distinct_races);
        let _ = writeln!(
            out,
            "Suppressed {} duplicate race reports.",
            summary.duplicate_races
        );
        out
    }

    /// Render the report as JSON
    pub fn render_json(&self, summary: &RaceSummary) -> serde_json::Result<String> {
        let races: Vec<JsonRace<'_>> = summary
            .races
            .iter()
            .map(|entry| JsonRace {
                kind: entry.record.kind.as_str(),
                address: format!("{:#x}", entry.record.addr),
                duplicates: entry.duplicates,
                first: self.json_access(&entry.record.first),
                second: self.json_access(&entry.record.second),
                allocation: entry.record.alloc.as_ref().map(|alloc| JsonAlloc {
                    origin: alloc.origin.as_str(),
                    access: self.json_access(&alloc.loc),
                }),
            })
            .collect();

        serde_json::to_string_pretty(&JsonReport {
            distinct_races: summary.distinct_races,
            duplicate_races: summary.duplicate_races,
            races,
        })
    }

    fn write_race(&self, out: &mut String, entry: &RaceEntry) {
        let record = &entry.record;
        let _ = writeln!(
            out,
            "{}Race detected on location {:#x} ({}){}",
            self.paint(RED),
            record.addr,
            record.kind,
            self.paint(RESET)
        );
        self.write_access(out, "*", &record.first);
        self.write_access(out, "+", &record.second);
        if let Some(alloc) = &record.alloc {
            self.write_alloc(out, alloc);
        }
        if entry.duplicates > 0 {
            let _ = writeln!(out, "   ({} duplicate reports)", entry.duplicates);
        }
        out.push('\n');
    }

    fn write_access(&self, out: &mut String, marker: &str, loc: &AccessLoc) {
        let _ = writeln!(
            out,
            "{}{}  {:<10} {}{}",
            self.paint(BOLD),
            marker,
            loc.kind.as_str(),
            self.sources.describe(loc.id),
            self.paint(RESET)
        );
        self.write_stack(out, loc);
    }

    fn write_alloc(&self, out: &mut String, alloc: &AllocContext) {
        let _ = writeln!(
            out,
            "{}\\| {} object {} at {}{}",
            self.paint(YELLOW),
            alloc.origin.as_str(),
            if alloc.loc.kind.is_write() { "freed" } else { "allocated" },
            self.sources.describe(alloc.loc.id),
            self.paint(RESET)
        );
        self.write_stack(out, &alloc.loc);
    }

    fn write_stack(&self, out: &mut String, loc: &AccessLoc) {
        for site in loc.stack.iter().take(self.max_stack_depth) {
            let _ = writeln!(
                out,
                "|      {:<6} {}",
                site.kind.as_str(),
                self.sources.describe(site.id)
            );
        }
        if loc.stack.depth() > self.max_stack_depth {
            let _ = writeln!(
                out,
                "|      ... ({} more frames)",
                loc.stack.depth() - self.max_stack_depth
            );
        }
    }

    fn paint(&self, code: &'static str) -> &'static str {
        if self.color {
            code
        } else {
            ""
        }
    }

    fn json_access(&self, loc: &AccessLoc) -> JsonAccess {
        JsonAccess {
            id: loc.id.raw(),
            access: loc.kind.as_str(),
            location: self.sources.get(loc.id).map(|l| l.to_string()),
            stack: loc
                .stack
                .iter()
                .take(self.max_stack_depth)
                .map(|site| JsonFrame {
                    kind: site.kind.as_str(),
                    id: site.id.raw(),
                    location: self.sources.get(site.id).map(|l| l.to_string()),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    distinct_races: usize,
    duplicate_races: u64,
    races: Vec<JsonRace<'a>>,
}

#[derive(Serialize)]
struct JsonRace<'a> {
    kind: &'a str,
    address: String,
    duplicates: u64,
    first: JsonAccess,
    second: JsonAccess,
    #[serde(skip_serializing_if = "Option::is_none")]
    allocation: Option<JsonAlloc>,
}

#[derive(Serialize)]
struct JsonAccess {
    id: u64,
    access: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    stack: Vec<JsonFrame>,
}

#[derive(Serialize)]
struct JsonFrame {
    kind: &'static str,
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

#[derive(Serialize)]
struct JsonAlloc {
    origin: &'static str,
    access: JsonAccess,
}

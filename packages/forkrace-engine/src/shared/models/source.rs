//! Source-location registry for report rendering
use super::ids::InstrId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source position of an instrumented instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub function: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}:{}", self.function, self.file, self.line, self.column)
    }
}

/// Maps instruction ids to source locations
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    locations: FxHashMap<InstrId, SourceLocation>,
}

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the location of an instruction
    pub fn register(&mut self, id: InstrId, location: SourceLocation) {
        self.locations.insert(id, location);
    }

    pub fn get(&self, id: InstrId) -> Option<&SourceLocation> {
        self.locations.get(&id)
    }

    /// Render an instruction for a report, falling back to the raw id
    pub fn describe(&self, id: InstrId) -> String {
        match self.locations.get(&id) {
            Some(location) => format!("{} {}", id, location),
            None => id.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

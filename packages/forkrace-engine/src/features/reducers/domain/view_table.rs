//! View tables and their merge
use crate::errors::{DetectorError, Result};
use crate::features::reducers::ports::ReducerOps;
use crate::shared::models::{Address, ReducerKey};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// View of one accumulator owned by a strand
#[derive(Clone)]
pub struct ViewEntry {
    pub view: Address,
    pub size: usize,
    pub ops: Arc<dyn ReducerOps>,
}

impl ViewEntry {
    /// The leftmost view lives at the accumulator's own address
    pub fn is_leftmost(&self, key: ReducerKey) -> bool {
        self.view == key
    }
}

impl fmt::Debug for ViewEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewEntry")
            .field("view", &format_args!("{:#x}", self.view))
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// View discarded by a merge; its storage and shadow records must be released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetiredView {
    pub view: Address,
    pub size: usize,
}

/// Accumulator key -> view, for one frame
#[derive(Debug, Clone, Default)]
pub struct ViewTable {
    entries: FxHashMap<ReducerKey, ViewEntry>,
}

impl ViewTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ReducerKey) -> Option<&ViewEntry> {
        self.entries.get(&key)
    }

    pub fn insert(&mut self, key: ReducerKey, entry: ViewEntry) -> Option<ViewEntry> {
        self.entries.insert(key, entry)
    }

    pub fn remove(&mut self, key: ReducerKey) -> Option<ViewEntry> {
        self.entries.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ReducerKey, &ViewEntry)> {
        self.entries.iter()
    }
}

/// Result of merging two tables
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub table: ViewTable,
    pub retired: Vec<RetiredView>,
}

/// Merge `right` into `left`, where `left` precedes `right` in program order
///
/// Entries of the smaller table are moved into the larger one; when both
/// hold a view of the same accumulator the right view is reduced into the
/// left one and retired.
pub fn merge_tables(left: ViewTable, right: ViewTable) -> Result<MergeOutcome> {
    let right_is_src = left.len() >= right.len();
    let (mut dst, src) = if right_is_src {
        (left, right)
    } else {
        (right, left)
    };

    let mut retired = Vec::new();
    for (key, src_entry) in src.entries {
        let Some(dst_entry) = dst.entries.remove(&key) else {
            dst.entries.insert(key, src_entry);
            continue;
        };

        let (left_entry, right_entry) = if right_is_src {
            (dst_entry, src_entry)
        } else {
            (src_entry, dst_entry)
        };
        if right_entry.is_leftmost(key) {
            return Err(DetectorError::model_violation(
                "reducer_merge",
                format!("leftmost view of {:#x} follows another view in program order", key),
            ));
        }

        left_entry
            .ops
            .reduce(left_entry.view, right_entry.view, left_entry.size);
        retired.push(RetiredView {
            view: right_entry.view,
            size: right_entry.size,
        });
        dst.entries.insert(key, left_entry);
    }

    Ok(MergeOutcome {
        table: dst,
        retired,
    })
}

/// Reduce every private view of `table` into its leftmost view
///
/// Leftmost entries carry no private state and are dropped with the table.
pub fn reduce_into_leftmost(table: ViewTable) -> Vec<RetiredView> {
    let mut retired = Vec::new();
    for (key, entry) in table.entries {
        if entry.is_leftmost(key) {
            continue;
        }
        entry.ops.reduce(key, entry.view, entry.size);
        retired.push(RetiredView {
            view: entry.view,
            size: entry.size,
        });
    }
    retired
}

//! Frame domain model
use crate::features::reducers::ViewTable;
use crate::features::sp_bags::BagId;
use crate::shared::models::{InstrId, SyncRegionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    Root,
    Function,
    Helper,
    Detach,
    Loop,
    Iteration,
}

impl FrameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Root => "root",
            FrameKind::Function => "function",
            FrameKind::Helper => "helper",
            FrameKind::Detach => "detach",
            FrameKind::Loop => "loop",
            FrameKind::Iteration => "iteration",
        }
    }
}

/// Outstanding spawns of one sync region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncRegion {
    /// Parallel bag holding children that returned since the last sync
    pub pbag: Option<BagId>,
    /// A spawn has been observed in this region at least once
    pub spawned: bool,
}

/// How a finished frame's bag joins its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    /// Called frame: into the parent's Series bag
    Series,
    /// Spawned frame: into the parent's Parallel bag of the region
    Parallel(SyncRegionId),
}

/// One activation
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    /// Instruction that created the frame
    pub entry: InstrId,
    /// Series bag of the frame's own strand
    pub sbag: BagId,
    /// Indexed by sync region id, grown on demand
    pub regions: Vec<SyncRegion>,
    /// Parent region a `Detach` frame was spawned into
    pub detach_region: Option<SyncRegionId>,
    /// The frame resumed after a spawn whose child is still unsynced
    pub in_continuation: bool,
    /// A `loop_begin` is waiting for its first iteration
    pub start_new_loop: bool,
    /// Reducer views created while in continuation
    pub views: ViewTable,
}

impl Frame {
    pub fn new(kind: FrameKind, entry: InstrId, sbag: BagId) -> Self {
        Self {
            kind,
            entry,
            sbag,
            regions: Vec::new(),
            detach_region: None,
            in_continuation: false,
            start_new_loop: false,
            views: ViewTable::new(),
        }
    }

    pub fn region(&self, id: SyncRegionId) -> SyncRegion {
        self.regions.get(id as usize).copied().unwrap_or_default()
    }

    pub fn region_mut(&mut self, id: SyncRegionId) -> &mut SyncRegion {
        let idx = id as usize;
        if idx >= self.regions.len() {
            self.regions.resize(idx + 1, SyncRegion::default());
        }
        &mut self.regions[idx]
    }

    /// No region has children waiting for a sync
    pub fn is_locally_synced(&self) -> bool {
        self.regions.iter().all(|region| region.pbag.is_none())
    }
}

//! Frame stack and the bag transitions of every control event
//!
//! The stack always holds the root frame; everything above it was pushed by
//! a call, a detach or a loop event and is popped by the matching return,
//! detach-continue or loop event.

use crate::errors::{DetectorError, Result};
use crate::features::frames::domain::{Frame, FrameKind, Join};
use crate::features::sp_bags::{BagForest, BagId, BagKind};
use crate::shared::models::{InstrId, SyncRegionId};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FrameStack {
    frames: Vec<Frame>,
    /// Region ids at or above this are rejected
    max_regions: u32,
}

impl FrameStack {
    /// Stack holding only the root frame
    ///
    /// Every frame accepts sync region ids below `max_regions`.
    pub fn new(forest: &mut BagForest, max_regions: u32) -> Result<Self> {
        let sbag = forest.make_bag(BagKind::Series)?;
        let mut root = Frame::new(FrameKind::Root, InstrId::new(0), sbag);
        root.region_mut(0);
        Ok(Self {
            frames: vec![root],
            max_regions: max_regions.max(1),
        })
    }

    /// Number of frames, including the root
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn top(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    #[inline]
    pub fn top_mut(&mut self) -> &mut Frame {
        let idx = self.frames.len() - 1;
        &mut self.frames[idx]
    }

    pub fn get(&self, idx: usize) -> Option<&Frame> {
        self.frames.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Frame> {
        self.frames.get_mut(idx)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Bag that governs accesses of the running strand
    #[inline]
    pub fn current_bag(&self) -> BagId {
        self.top().sbag
    }

    /// Push a frame with a fresh Series bag
    pub fn push(&mut self, kind: FrameKind, entry: InstrId, forest: &mut BagForest) -> Result<()> {
        let sbag = forest.make_bag(BagKind::Series)?;
        debug!(target: "forkrace::frames", "enter {} frame {} ({})", kind.as_str(), entry, sbag);
        self.frames.push(Frame::new(kind, entry, sbag));
        Ok(())
    }

    /// Spawn point: push the child strand's frame into `region` of the current frame
    pub fn push_detach(
        &mut self,
        entry: InstrId,
        region: SyncRegionId,
        forest: &mut BagForest,
    ) -> Result<()> {
        self.mark_spawned(region)?;
        self.push(FrameKind::Detach, entry, forest)?;
        self.top_mut().detach_region = Some(region);
        Ok(())
    }

    /// Record that the current frame spawned into `region`
    pub fn mark_spawned(&mut self, region: SyncRegionId) -> Result<()> {
        if region >= self.max_regions {
            return Err(DetectorError::exhausted(
                "sync regions per frame",
                self.max_regions as usize,
            ));
        }
        self.top_mut().region_mut(region).spawned = true;
        Ok(())
    }

    /// Join the children of `region` into the current frame's Series bag
    ///
    /// With `strict`, syncing a region that never saw a spawn is a model
    /// violation.
    pub fn sync(&mut self, region: SyncRegionId, strict: bool, forest: &mut BagForest) -> Result<()> {
        let frame = self.top_mut();
        let state = frame.region(region);
        if strict && !state.spawned {
            return Err(DetectorError::model_violation(
                "sync",
                format!(
                    "sync region {} of {} frame {} never observed a spawn",
                    region,
                    frame.kind.as_str(),
                    frame.entry
                ),
            ));
        }
        if let Some(pbag) = state.pbag {
            forest.union_into(frame.sbag, pbag);
            frame.region_mut(region).pbag = None;
            debug!(target: "forkrace::bags", "sync region {} of frame {}", region, frame.entry);
        }
        Ok(())
    }

    /// Join every region of the current frame
    pub fn sync_all(&mut self, forest: &mut BagForest) {
        let frame = self.top_mut();
        for region in frame.regions.iter_mut() {
            if let Some(pbag) = region.pbag.take() {
                forest.union_into(frame.sbag, pbag);
            }
        }
    }

    /// Pop the current frame and join its bag into the new top frame
    pub fn pop(&mut self, join: Join, forest: &mut BagForest) -> Result<Frame> {
        let child = match self.frames.pop() {
            Some(frame) if !self.frames.is_empty() => frame,
            popped => {
                self.frames.extend(popped);
                return Err(DetectorError::model_violation(
                    "frame_pop",
                    "cannot pop the root frame",
                ));
            }
        };
        let parent = self.top_mut();

        match join {
            Join::Series => {
                forest.union_into(parent.sbag, child.sbag);
            }
            Join::Parallel(region) => {
                let slot = parent.region_mut(region);
                match slot.pbag {
                    Some(pbag) => {
                        forest.union_into(pbag, child.sbag);
                    }
                    None => {
                        forest.set_kind(child.sbag, BagKind::Parallel);
                        slot.pbag = Some(child.sbag);
                    }
                }
            }
        }
        debug!(
            target: "forkrace::frames",
            "leave {} frame {} ({:?})",
            child.kind.as_str(),
            child.entry,
            join
        );
        Ok(child)
    }

    /// Index of the innermost frame below `below` that is in continuation
    pub fn continuation_below(&self, below: usize) -> Option<usize> {
        self.frames[..below.min(self.frames.len())]
            .iter()
            .rposition(|frame| frame.in_continuation)
    }

    /// Index of the innermost frame in continuation
    pub fn innermost_continuation(&self) -> Option<usize> {
        self.continuation_below(self.frames.len())
    }
}

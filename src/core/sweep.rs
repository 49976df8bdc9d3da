/// Scroll-settle removal of expired entries.
///
/// Faded entries are not detached right away: the sweep waits until the
/// viewport has stayed scrolled to the bottom for a number of consecutive
/// frames, so history is never pulled out from under a reader who scrolled
/// up. Any frame away from the bottom restarts the count.
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::schema::ids::EntryId;

/// What the controller should do after a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepStep {
    /// No sweep in progress; the frame was not requested.
    Idle,
    /// Keep counting; request another frame.
    Continue,
    /// Settled. Detach these entries.
    Flush(Vec<EntryId>),
}

#[derive(Debug, Clone)]
pub struct RemovalSweep {
    settle_frames: u32,
    pending: Vec<EntryId>,
    seen: FxHashSet<EntryId>,
    frames_left: u32,
    frame_requested: bool,
}

impl RemovalSweep {
    pub fn new(settle_frames: u32) -> Self {
        Self {
            settle_frames,
            pending: Vec::new(),
            seen: FxHashSet::default(),
            frames_left: settle_frames,
            frame_requested: false,
        }
    }

    pub fn contains(&self, entry: EntryId) -> bool {
        self.seen.contains(&entry)
    }

    pub fn pending(&self) -> &[EntryId] {
        &self.pending
    }

    /// Add a faded entry and restart the frame count. Returns true when the
    /// caller must request a frame to drive the sweep.
    pub fn schedule(&mut self, entry: EntryId) -> bool {
        if !self.seen.insert(entry) {
            return false;
        }
        self.pending.push(entry);
        self.frames_left = self.settle_frames;
        if self.frame_requested {
            false
        } else {
            self.frame_requested = true;
            true
        }
    }

    pub fn on_frame(&mut self, at_bottom: bool) -> SweepStep {
        if !self.frame_requested {
            return SweepStep::Idle;
        }
        self.frame_requested = false;

        if at_bottom {
            self.frames_left = self.frames_left.saturating_sub(1);
        } else {
            self.frames_left = self.settle_frames;
        }
        trace!(frames_left = self.frames_left, at_bottom, "settle check");

        if self.frames_left == 0 {
            self.seen.clear();
            self.frames_left = self.settle_frames;
            SweepStep::Flush(std::mem::take(&mut self.pending))
        } else {
            self.frame_requested = true;
            SweepStep::Continue
        }
    }
}

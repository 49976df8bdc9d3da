use serde::{Deserialize, Serialize};

use super::ids::{ClipId, EntryId, PlaybackId, TimerId, UtteranceId};

/// Everything the host reports back to the feed: raw input gestures and the
/// completion of work requested through a [`Command`](super::command::Command).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    PressStart,
    PressEnd,
    TimerFired { timer: TimerId },
    PlaybackEnded { playback: PlaybackId },
    UtteranceEnded { utterance: UtteranceId },
    ClipLoaded { clip: ClipId },
    ClipFailed { clip: ClipId, reason: String },
    FadeEnded { entry: EntryId },
    /// One animation frame elapsed. `at_bottom` is true when the viewport is
    /// scrolled to the end of the feed.
    Frame { at_bottom: bool },
}

impl FeedEvent {
    /// Input gestures are gated on initialization; completions are not.
    pub fn is_input(&self) -> bool {
        matches!(self, FeedEvent::PressStart | FeedEvent::PressEnd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_classification() {
        assert!(FeedEvent::PressStart.is_input());
        assert!(FeedEvent::PressEnd.is_input());
        assert!(!FeedEvent::Frame { at_bottom: true }.is_input());
        assert!(!FeedEvent::TimerFired { timer: TimerId(0) }.is_input());
    }
}

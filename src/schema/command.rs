use serde::{Deserialize, Serialize};

use super::fragment::Fragment;
use super::ids::{ClipId, EntryId, PlaybackId, TimerId, UtteranceId};
use super::view::EntryView;

/// Oscillator shape for synthesized tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A fully resolved tone, ready for the host synthesizer.
///
/// The host ramps gain linearly from 0 to `gain` over `attack` seconds, then
/// back to 0 over `release` seconds, through a low-pass filter at `lowpass_hz`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub gain: f32,
    pub waveform: Waveform,
    pub attack: f32,
    pub release: f32,
    pub lowpass_hz: f32,
}

/// Effects requested by the feed. The host executes them in order and reports
/// completions back as [`FeedEvent`](super::event::FeedEvent)s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Append an entry's visual to the feed container.
    Attach { view: EntryView },
    /// Move the selected marker of a choice list to `choice`.
    Select { entry: EntryId, choice: usize },
    /// Start the fade-out animation; answer with `FadeEnded`.
    Fade { entry: EntryId },
    /// Detach an entry's visual from the feed container.
    Detach { entry: EntryId },
    /// Set the navigation fragment to the current entry.
    SetAnchor { anchor: String },
    /// Answer with `PlaybackEnded` when the envelope finishes.
    PlayTone { playback: PlaybackId, tone: ToneSpec },
    /// Play a decoded clip; answer with `PlaybackEnded`.
    PlayClip {
        playback: PlaybackId,
        clip: ClipId,
        gain: f32,
    },
    /// Fetch and decode a clip; answer with `ClipLoaded` or `ClipFailed`.
    FetchClip { clip: ClipId, url: String },
    /// Stop and drop every queued or playing utterance.
    CancelSpeech,
    /// Queue one utterance; answer with `UtteranceEnded`.
    Speak {
        utterance: UtteranceId,
        fragment: Fragment,
    },
    /// Answer with `TimerFired` after `delay_ms`, unless cancelled.
    StartTimer { timer: TimerId, delay_ms: u64 },
    CancelTimer { timer: TimerId },
    /// Answer with `Frame` on the next animation frame.
    RequestFrame,
}

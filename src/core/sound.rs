/// Audio player: synthesized tones and lazily loaded sample clips.
///
/// The player never produces audio itself. It turns a [`Sound`] into host
/// commands and remembers, per playback id, the completion token to hand
/// back when the host reports that playback ended.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::core::config::AudioConfig;
use crate::schema::command::{Command, ToneSpec, Waveform};
use crate::schema::ids::{ClipId, PlaybackId, Sequence};

/// An attack/release enveloped oscillator note. Always ready to play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    /// MIDI note number; 69 is A4 (440 Hz).
    pub pitch: f32,
    pub gain: f32,
    pub waveform: Waveform,
    /// Seconds from silence to peak gain.
    pub attack: f32,
    /// Seconds from peak gain back to silence.
    pub release: f32,
}

impl Tone {
    pub fn new(pitch: f32, gain: f32, waveform: Waveform, attack: f32, release: f32) -> Self {
        Self {
            pitch,
            gain,
            waveform,
            attack,
            release,
        }
    }

    pub fn frequency_hz(&self) -> f32 {
        440.0 * 2f32.powf((self.pitch - 69.0) / 12.0)
    }

    /// Total envelope length in seconds.
    pub fn duration(&self) -> f32 {
        self.attack + self.release
    }

    fn spec(&self, audio: &AudioConfig) -> ToneSpec {
        ToneSpec {
            frequency_hz: self.frequency_hz(),
            gain: self.gain * audio.master_gain,
            waveform: self.waveform,
            attack: self.attack,
            release: self.release,
            lowpass_hz: audio.lowpass_hz,
        }
    }
}

/// A sampled sound, fetched from the asset root on first play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub path: String,
}

impl Clip {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn id(&self) -> ClipId {
        ClipId(self.path.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sound {
    Tone(Tone),
    Clip(Clip),
}

/// Load state of a clip within one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipState {
    Unloaded,
    Loading,
    Ready,
}

/// The fixed sounds of the feed: press feedback and the choice palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundBank {
    pub press_down: Sound,
    pub press_up: Sound,
    pub press_long: Sound,
    /// Ascending tones that audibly distinguish choice positions.
    pub palette: Vec<Sound>,
}

impl Default for SoundBank {
    fn default() -> Self {
        let palette = [73.0, 75.0, 76.0, 78.0, 80.0, 82.0, 83.0, 85.0, 87.0, 88.0]
            .into_iter()
            .map(|pitch| Sound::Tone(Tone::new(pitch, 1.0, Waveform::Sawtooth, 0.1, 0.2)))
            .collect();
        Self {
            press_down: Sound::Tone(Tone::new(66.0, 1.0, Waveform::Square, 0.01, 0.1)),
            press_up: Sound::Tone(Tone::new(63.0, 0.2, Waveform::Square, 0.01, 0.05)),
            press_long: Sound::Tone(Tone::new(71.0, 1.0, Waveform::Square, 0.01, 0.3)),
            palette,
        }
    }
}

impl SoundBank {
    /// Palette sound for a choice position, wrapping around the palette.
    pub fn palette_sound(&self, index: usize) -> Option<&Sound> {
        if self.palette.is_empty() {
            return None;
        }
        self.palette.get(index % self.palette.len())
    }
}

/// Plays sounds and tracks their completions.
///
/// `C` is the completion token the caller wants back when a playback ends.
/// Concurrent plays are not serialized; the host mixes them.
#[derive(Debug)]
pub struct SoundPlayer<C> {
    audio: AudioConfig,
    playbacks: Sequence,
    pending: FxHashMap<PlaybackId, Option<C>>,
    clips: FxHashMap<ClipId, ClipState>,
}

impl<C> SoundPlayer<C> {
    pub fn new(audio: AudioConfig) -> Self {
        Self {
            audio,
            playbacks: Sequence::new(),
            pending: FxHashMap::default(),
            clips: FxHashMap::default(),
        }
    }

    /// Start playing `sound`. Returns the playback id when audio actually
    /// starts; `None` when a clip is still loading, in which case
    /// `on_complete` is dropped and the clip plays without it once loaded.
    pub fn play(
        &mut self,
        sound: &Sound,
        on_complete: Option<C>,
        out: &mut Vec<Command>,
    ) -> Option<PlaybackId> {
        match sound {
            Sound::Tone(tone) => {
                let playback = self.register(on_complete);
                out.push(Command::PlayTone {
                    playback,
                    tone: tone.spec(&self.audio),
                });
                Some(playback)
            }
            Sound::Clip(clip) => self.play_clip(clip.id(), on_complete, out),
        }
    }

    fn play_clip(
        &mut self,
        clip: ClipId,
        on_complete: Option<C>,
        out: &mut Vec<Command>,
    ) -> Option<PlaybackId> {
        match self.clip_state(&clip) {
            ClipState::Ready => {
                let playback = self.register(on_complete);
                out.push(Command::PlayClip {
                    playback,
                    clip,
                    gain: self.audio.master_gain,
                });
                Some(playback)
            }
            ClipState::Loading => {
                debug!(clip = %clip, "clip still loading, dropping play request");
                None
            }
            ClipState::Unloaded => {
                debug!(clip = %clip, "attempting to load sound");
                let url = self.audio.clip_url(&clip.0);
                self.clips.insert(clip.clone(), ClipState::Loading);
                out.push(Command::FetchClip { clip, url });
                None
            }
        }
    }

    fn register(&mut self, on_complete: Option<C>) -> PlaybackId {
        let playback = PlaybackId(self.playbacks.next());
        self.pending.insert(playback, on_complete);
        playback
    }

    /// The host finished a playback. Returns its completion token, if any.
    pub fn playback_ended(&mut self, playback: PlaybackId) -> Option<C> {
        match self.pending.remove(&playback) {
            Some(token) => token,
            None => {
                debug!(playback = playback.0, "unknown playback ended");
                None
            }
        }
    }

    /// The host decoded a clip. It is cached for the player's lifetime and
    /// played once immediately, without a completion.
    pub fn clip_loaded(&mut self, clip: ClipId, out: &mut Vec<Command>) -> Option<PlaybackId> {
        debug!(clip = %clip, "loaded sound");
        let previous = self.clips.insert(clip.clone(), ClipState::Ready);
        if previous == Some(ClipState::Loading) {
            self.play_clip(clip, None, out)
        } else {
            None
        }
    }

    /// The host failed to fetch or decode a clip. The failure is logged and
    /// the slot reset, so the next play attempts the load again.
    pub fn clip_failed(&mut self, clip: &ClipId, reason: &str) {
        error!(clip = %clip, reason, "failed to load sound");
        self.clips.remove(clip);
    }

    pub fn clip_state(&self, clip: &ClipId) -> ClipState {
        self.clips.get(clip).copied().unwrap_or(ClipState::Unloaded)
    }

    /// Number of playbacks started and not yet reported ended.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

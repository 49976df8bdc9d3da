/// The feed controller: queue, history, gesture routing, and cleanup.
///
/// All state lives in one owned [`FeedController`]. The host feeds it
/// [`FeedEvent`]s and executes the [`Command`]s it drains afterwards.
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::{ConfigError, FeedConfig};
use crate::core::entry::{Continuation, Entry, EntryContext, EntryState};
use crate::core::narrator::Narrator;
use crate::core::queue::{ChoiceBuilder, FeedQueue, SayHandle};
use crate::core::sound::SoundPlayer;
use crate::core::sweep::{RemovalSweep, SweepStep};
use crate::schema::command::Command;
use crate::schema::event::FeedEvent;
use crate::schema::fragment::Content;
use crate::schema::ids::{EntryId, Sequence, TimerId};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("choice entry {0} has no choices")]
    EmptyChoice(EntryId),
    #[error("feed input is already initialized")]
    AlreadyInitialized,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Short,
    Long,
}

pub struct FeedController {
    config: FeedConfig,
    queue: FeedQueue,
    history: VecDeque<Entry>,
    expired: FxHashMap<EntryId, Entry>,
    sweep: RemovalSweep,
    narrator: Narrator<Continuation>,
    player: SoundPlayer<Continuation>,
    timers: Sequence,
    long_press: Option<TimerId>,
    initialized: bool,
    outbox: Vec<Command>,
}

impl Default for FeedController {
    fn default() -> Self {
        Self::with_config(FeedConfig::default())
    }
}

impl FeedController {
    /// Build a controller after validating `config`.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: FeedConfig) -> Self {
        Self {
            sweep: RemovalSweep::new(config.settle_frames),
            player: SoundPlayer::new(config.audio.clone()),
            config,
            queue: FeedQueue::new(),
            history: VecDeque::new(),
            expired: FxHashMap::default(),
            narrator: Narrator::new(),
            timers: Sequence::new(),
            long_press: None,
            initialized: false,
            outbox: Vec::new(),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    // --- Script surface ---

    pub fn say(&mut self, content: impl Into<Content>) -> SayHandle<'_> {
        self.queue.say(content)
    }

    pub fn choose(&mut self) -> ChoiceBuilder<'_> {
        self.queue.choose()
    }

    pub fn queue_mut(&mut self) -> &mut FeedQueue {
        &mut self.queue
    }

    /// Open the input gate. Gestures reported before this are ignored.
    pub fn initialize(&mut self) -> Result<(), FeedError> {
        if self.initialized {
            return Err(FeedError::AlreadyInitialized);
        }
        self.initialized = true;
        info!(
            long_press_ms = self.config.long_press_ms,
            history_limit = self.config.history_limit,
            "feed input initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Display the next queued entry, ending the current one. Does nothing
    /// when the queue is empty.
    pub fn advance(&mut self) -> Result<(), FeedError> {
        if let Some(next) = self.queue.front() {
            next.validate()?;
        }
        let Some(mut entry) = self.queue.pop_front() else {
            debug!("advance with empty queue");
            return Ok(());
        };

        if let Some(current) = self.history.back_mut() {
            current.on_end();
        }

        entry.render();
        self.outbox.push(Command::Attach {
            view: entry.view().clone(),
        });
        let mut ctx = EntryContext::new(
            &mut self.narrator,
            &mut self.player,
            &self.config.sounds,
            &mut self.outbox,
        );
        entry.on_display(&mut ctx);
        debug!(entry = %entry.id(), "entry displayed");

        let anchor = entry.id().anchor();
        self.history.push_back(entry);
        self.outbox.push(Command::SetAnchor { anchor });
        self.evict();
        Ok(())
    }

    /// Pop entries past the history limit, oldest first, and start fading
    /// them out.
    fn evict(&mut self) {
        while self.history.len() > self.config.history_limit {
            let Some(mut entry) = self.history.pop_front() else {
                break;
            };
            entry.expire();
            self.outbox.push(Command::Fade { entry: entry.id() });
            self.expired.insert(entry.id(), entry);
        }
    }

    pub fn handle(&mut self, event: FeedEvent) -> Result<(), FeedError> {
        if event.is_input() && !self.initialized {
            debug!(?event, "input before initialization ignored");
            return Ok(());
        }
        match event {
            FeedEvent::PressStart => {
                self.press_start();
                Ok(())
            }
            FeedEvent::PressEnd => self.press_end(),
            FeedEvent::TimerFired { timer } => self.timer_fired(timer),
            FeedEvent::PlaybackEnded { playback } => match self.player.playback_ended(playback) {
                Some(continuation) => self.resume(continuation),
                None => Ok(()),
            },
            FeedEvent::UtteranceEnded { utterance } => {
                match self.narrator.utterance_ended(utterance) {
                    Some(continuation) => self.resume(continuation),
                    None => Ok(()),
                }
            }
            FeedEvent::ClipLoaded { clip } => {
                self.player.clip_loaded(clip, &mut self.outbox);
                Ok(())
            }
            FeedEvent::ClipFailed { clip, reason } => {
                self.player.clip_failed(&clip, &reason);
                Ok(())
            }
            FeedEvent::FadeEnded { entry } => {
                self.fade_ended(entry);
                Ok(())
            }
            FeedEvent::Frame { at_bottom } => {
                self.frame(at_bottom);
                Ok(())
            }
        }
    }

    /// Take every command produced since the last drain, in order.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    // --- Input routing ---

    fn press_start(&mut self) {
        self.player
            .play(&self.config.sounds.press_down, None, &mut self.outbox);
        if let Some(stale) = self.long_press.take() {
            self.outbox.push(Command::CancelTimer { timer: stale });
        }
        let timer = TimerId(self.timers.next());
        self.outbox.push(Command::StartTimer {
            timer,
            delay_ms: self.config.long_press_ms,
        });
        self.long_press = Some(timer);
    }

    fn press_end(&mut self) -> Result<(), FeedError> {
        self.player
            .play(&self.config.sounds.press_up, None, &mut self.outbox);
        // No timer means the long press already fired.
        let Some(timer) = self.long_press.take() else {
            return Ok(());
        };
        self.outbox.push(Command::CancelTimer { timer });
        self.dispatch(Gesture::Short)
    }

    fn timer_fired(&mut self, timer: TimerId) -> Result<(), FeedError> {
        if self.long_press != Some(timer) {
            debug!(timer = timer.0, "stale timer ignored");
            return Ok(());
        }
        self.long_press = None;
        self.dispatch(Gesture::Long)
    }

    /// Dispatch a short action to the most recently displayed entry.
    pub fn short_action(&mut self) -> Result<(), FeedError> {
        self.dispatch(Gesture::Short)
    }

    /// Dispatch a long action to the most recently displayed entry.
    pub fn long_action(&mut self) -> Result<(), FeedError> {
        self.dispatch(Gesture::Long)
    }

    fn dispatch(&mut self, gesture: Gesture) -> Result<(), FeedError> {
        let Some(entry) = self.history.back_mut() else {
            return Ok(());
        };
        let mut ctx = EntryContext::new(
            &mut self.narrator,
            &mut self.player,
            &self.config.sounds,
            &mut self.outbox,
        );
        match gesture {
            Gesture::Short => entry.on_short_action(&mut ctx),
            Gesture::Long => {
                entry.on_cancel_short_action(&mut ctx);
                entry.on_long_action(&mut ctx);
            }
        }
        if ctx.advance_requested() {
            self.advance()?;
        }
        Ok(())
    }

    // --- Completions ---

    fn resume(&mut self, continuation: Continuation) -> Result<(), FeedError> {
        match continuation {
            Continuation::SayFinished(id) => {
                let finished = self
                    .entry_mut(id)
                    .map(|entry| entry.on_narration_finished())
                    .unwrap_or(false);
                if finished {
                    self.advance()?;
                }
                Ok(())
            }
            Continuation::ConfirmChoice(id, choice) => {
                let actions = self
                    .entry_mut(id)
                    .map(|entry| entry.on_confirmed(choice))
                    .unwrap_or_default();
                for action in actions {
                    action(&mut self.queue);
                }
                self.advance()
            }
            Continuation::AnnounceChoice(fragments) => {
                self.narrator.narrate(&fragments, None, &mut self.outbox);
                Ok(())
            }
        }
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        if let Some(entry) = self.history.iter_mut().rev().find(|e| e.id() == id) {
            return Some(entry);
        }
        self.expired.get_mut(&id)
    }

    // --- Expiry ---

    fn fade_ended(&mut self, entry: EntryId) {
        if !self.expired.contains_key(&entry) || self.sweep.contains(entry) {
            return;
        }
        if self.sweep.schedule(entry) {
            self.outbox.push(Command::RequestFrame);
        }
    }

    fn frame(&mut self, at_bottom: bool) {
        match self.sweep.on_frame(at_bottom) {
            SweepStep::Idle => {}
            SweepStep::Continue => self.outbox.push(Command::RequestFrame),
            SweepStep::Flush(entries) => {
                debug!(count = entries.len(), "detaching expired entries");
                for id in entries {
                    if self.expired.remove(&id).is_some() {
                        self.outbox.push(Command::Detach { entry: id });
                    }
                }
            }
        }
    }

    // --- Introspection ---

    /// Displayed entries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Entry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The most recently displayed entry; the target of gestures.
    pub fn current(&self) -> Option<&Entry> {
        self.history.back()
    }

    pub fn queue(&self) -> &FeedQueue {
        &self.queue
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Expired entries that finished fading and await detachment.
    pub fn pending_removal(&self) -> &[EntryId] {
        self.sweep.pending()
    }

    /// Expired entries still attached to the display surface.
    pub fn expired_len(&self) -> usize {
        self.expired.len()
    }

    pub fn long_press_pending(&self) -> bool {
        self.long_press.is_some()
    }

    pub fn entry_state(&self, id: EntryId) -> Option<EntryState> {
        if id.0 >= self.queue.issued() {
            return None;
        }
        let found = self
            .queue
            .iter()
            .chain(self.history.iter())
            .find(|e| e.id() == id)
            .or_else(|| self.expired.get(&id));
        // Entries leave the feed's ownership only by being detached.
        Some(found.map(|e| e.state()).unwrap_or(EntryState::Removed))
    }
}

/// Headless host: runs a feed without a browser.
///
/// Every command is answered with its natural completion: tones and clips
/// end, utterances finish (unless cancelled first), fades complete, and
/// clips load. Timers only fire when a hold gesture asks for it, and frames
/// are delivered while the simulated viewport sits at the bottom.
use std::collections::VecDeque;
use tracing::warn;

use crate::core::feed::{FeedController, FeedError};
use crate::schema::command::Command;
use crate::schema::event::FeedEvent;
use crate::schema::ids::{EntryId, TimerId};

/// Default upper bound on events processed by one [`HeadlessHost::settle`]
/// call.
const MAX_SETTLE_STEPS: usize = 100_000;

#[derive(Debug)]
pub struct HeadlessHost {
    max_steps: usize,
    events: VecDeque<FeedEvent>,
    timers: Vec<TimerId>,
    frame_wanted: bool,
    scrolled_up: bool,
    attached: Vec<EntryId>,
    spoken: Vec<String>,
    anchor: Option<String>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self {
            max_steps: MAX_SETTLE_STEPS,
            events: VecDeque::new(),
            timers: Vec::new(),
            frame_wanted: false,
            scrolled_up: false,
            attached: Vec::new(),
            spoken: Vec::new(),
            anchor: None,
        }
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of events one `settle` call may process.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Apply commands to the simulated surface and queue their completions.
    pub fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Attach { view } => self.attached.push(view.entry),
                Command::Select { .. } => {}
                Command::Fade { entry } => self.events.push_back(FeedEvent::FadeEnded { entry }),
                Command::Detach { entry } => self.attached.retain(|e| *e != entry),
                Command::SetAnchor { anchor } => self.anchor = Some(anchor),
                Command::PlayTone { playback, .. } | Command::PlayClip { playback, .. } => {
                    self.events.push_back(FeedEvent::PlaybackEnded { playback })
                }
                Command::FetchClip { clip, .. } => {
                    self.events.push_back(FeedEvent::ClipLoaded { clip })
                }
                Command::CancelSpeech => self
                    .events
                    .retain(|e| !matches!(e, FeedEvent::UtteranceEnded { .. })),
                Command::Speak {
                    utterance,
                    fragment,
                } => {
                    self.spoken.push(fragment.text);
                    self.events
                        .push_back(FeedEvent::UtteranceEnded { utterance });
                }
                Command::StartTimer { timer, .. } => self.timers.push(timer),
                Command::CancelTimer { timer } => self.timers.retain(|t| *t != timer),
                Command::RequestFrame => {
                    if self.scrolled_up {
                        self.frame_wanted = true;
                    } else {
                        self.events.push_back(FeedEvent::Frame { at_bottom: true });
                    }
                }
            }
        }
    }

    /// Process queued completions until the feed goes quiet.
    pub fn settle(&mut self, feed: &mut FeedController) -> Result<(), FeedError> {
        self.execute(feed.drain_commands());
        for _ in 0..self.max_steps {
            let Some(event) = self.events.pop_front() else {
                return Ok(());
            };
            feed.handle(event)?;
            self.execute(feed.drain_commands());
        }
        if !self.events.is_empty() {
            warn!(
                max_steps = self.max_steps,
                pending = self.events.len(),
                "feed did not settle, events left queued"
            );
        }
        Ok(())
    }

    /// Press and release before the long-press timer fires.
    pub fn tap(&mut self, feed: &mut FeedController) -> Result<(), FeedError> {
        feed.handle(FeedEvent::PressStart)?;
        self.execute(feed.drain_commands());
        feed.handle(FeedEvent::PressEnd)?;
        self.settle(feed)
    }

    /// Press, let the long-press timer fire, then release.
    pub fn hold(&mut self, feed: &mut FeedController) -> Result<(), FeedError> {
        feed.handle(FeedEvent::PressStart)?;
        self.execute(feed.drain_commands());
        if let Some(timer) = self.timers.pop() {
            feed.handle(FeedEvent::TimerFired { timer })?;
            self.execute(feed.drain_commands());
        }
        feed.handle(FeedEvent::PressEnd)?;
        self.settle(feed)
    }

    /// Simulate the reader scrolling away from, or back to, the bottom.
    pub fn set_scrolled_up(&mut self, scrolled_up: bool) {
        self.scrolled_up = scrolled_up;
        if !scrolled_up && self.frame_wanted {
            self.frame_wanted = false;
            self.events.push_back(FeedEvent::Frame { at_bottom: true });
        }
    }

    /// Entries currently attached to the simulated surface, in order.
    pub fn attached(&self) -> &[EntryId] {
        &self.attached
    }

    /// Every utterance spoken so far.
    pub fn spoken(&self) -> &[String] {
        &self.spoken
    }

    pub fn take_spoken(&mut self) -> Vec<String> {
        std::mem::take(&mut self.spoken)
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Completions queued but not yet delivered to the feed.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

/// Feed entries: the say and choice beats and their lifecycle.
use std::fmt;
use tracing::debug;

use crate::core::feed::FeedError;
use crate::core::narrator::{Narration, Narrator};
use crate::core::queue::FeedQueue;
use crate::core::sound::{SoundBank, SoundPlayer};
use crate::schema::command::Command;
use crate::schema::fragment::{join_text, Fragment};
use crate::schema::ids::EntryId;
use crate::schema::view::{EntryView, ItemView};

/// A script callback attached to a choice. Runs at most once, when that
/// choice is confirmed, and may enqueue further entries.
pub type Action = Box<dyn FnOnce(&mut FeedQueue)>;

/// Where an entry is in its life, from enqueue to detachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Enqueued, not yet shown.
    Created,
    /// Visible, narrating or awaiting input.
    Displayed,
    /// Superseded by the next displayed entry.
    Ended,
    /// Evicted from the history; fading out.
    Expired,
    /// Detached from the display surface and dropped.
    Removed,
}

/// Work to resume when an audio or speech completion arrives.
#[derive(Debug, Clone, PartialEq)]
pub enum Continuation {
    /// A say entry's narration reached its end.
    SayFinished(EntryId),
    /// The confirmation sound of a choice entry finished. Carries the
    /// option that was selected when the long press fired.
    ConfirmChoice(EntryId, usize),
    /// A palette sound finished; speak the choice it announced.
    AnnounceChoice(Vec<Fragment>),
}

/// What an entry may touch while handling display or a gesture.
pub struct EntryContext<'a> {
    pub narrator: &'a mut Narrator<Continuation>,
    pub player: &'a mut SoundPlayer<Continuation>,
    pub sounds: &'a SoundBank,
    pub out: &'a mut Vec<Command>,
    advance: bool,
}

impl<'a> EntryContext<'a> {
    pub fn new(
        narrator: &'a mut Narrator<Continuation>,
        player: &'a mut SoundPlayer<Continuation>,
        sounds: &'a SoundBank,
        out: &'a mut Vec<Command>,
    ) -> Self {
        Self {
            narrator,
            player,
            sounds,
            out,
            advance: false,
        }
    }

    /// Ask the controller to advance the feed once the handler returns.
    pub fn request_advance(&mut self) {
        self.advance = true;
    }

    pub fn advance_requested(&self) -> bool {
        self.advance
    }
}

/// A linear narrated beat.
#[derive(Debug, Clone)]
pub struct SayEntry {
    fragments: Vec<Fragment>,
    skipped: bool,
}

impl SayEntry {
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// True once the reader skipped ahead before narration finished.
    pub fn skipped(&self) -> bool {
        self.skipped
    }

    pub(crate) fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    fn on_display(&mut self, id: EntryId, ctx: &mut EntryContext<'_>) {
        let outcome = ctx.narrator.narrate(
            &self.fragments,
            Some(Continuation::SayFinished(id)),
            ctx.out,
        );
        // A silent narration never completes; the entry waits for a tap.
        if outcome == Narration::Silent {
            debug!(entry = %id, "say entry has nothing to narrate");
        }
    }

    fn on_short_action(&mut self, ctx: &mut EntryContext<'_>) {
        self.skipped = true;
        ctx.request_advance();
    }
}

/// One option of a choice entry.
pub struct Choice {
    fragments: Vec<Fragment>,
    actions: Vec<Action>,
}

impl Choice {
    pub fn new(fragments: Vec<Fragment>, actions: Vec<Action>) -> Self {
        Self { fragments, actions }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

impl fmt::Debug for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Choice")
            .field("fragments", &self.fragments)
            .field("actions", &self.actions.len())
            .finish()
    }
}

/// A branching beat. Short presses cycle the selection, a long press
/// confirms it. Confirmation happens once; afterwards short presses only
/// re-announce the current choice.
#[derive(Debug, Default)]
pub struct ChoiceEntry {
    choices: Vec<Choice>,
    selected: usize,
    chosen: bool,
}

impl ChoiceEntry {
    pub fn push(&mut self, choice: Choice) {
        self.choices.push(choice);
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn chosen(&self) -> bool {
        self.chosen
    }

    fn on_short_action(&mut self, id: EntryId, view: &mut EntryView, ctx: &mut EntryContext<'_>) {
        ctx.narrator.cancel(ctx.out);
        if !self.chosen && !self.choices.is_empty() {
            self.selected = (self.selected + 1) % self.choices.len();
        }
        self.read_choice(id, view, ctx);
    }

    fn on_long_action(&mut self, id: EntryId, ctx: &mut EntryContext<'_>) {
        ctx.narrator.cancel(ctx.out);
        ctx.player.play(
            &ctx.sounds.press_long,
            Some(Continuation::ConfirmChoice(id, self.selected)),
            ctx.out,
        );
    }

    /// Take the actions of option `index`, the first time only.
    fn confirm(&mut self, index: usize) -> Vec<Action> {
        if self.chosen {
            return Vec::new();
        }
        self.chosen = true;
        match self.choices.get_mut(index) {
            Some(choice) => std::mem::take(&mut choice.actions),
            None => Vec::new(),
        }
    }

    /// Mark the selected item, then play its palette tone followed by its
    /// narration.
    fn read_choice(&self, id: EntryId, view: &mut EntryView, ctx: &mut EntryContext<'_>) {
        let Some(choice) = self.choices.get(self.selected) else {
            return;
        };
        view.select(self.selected);
        ctx.out.push(Command::Select {
            entry: id,
            choice: self.selected,
        });
        if let Some(sound) = ctx.sounds.palette_sound(self.selected) {
            ctx.player.play(
                sound,
                Some(Continuation::AnnounceChoice(choice.fragments.clone())),
                ctx.out,
            );
        }
    }
}

#[derive(Debug)]
pub enum EntryKind {
    Say(SayEntry),
    Choice(ChoiceEntry),
}

/// One unit of feed content, owned by the feed from creation to removal.
#[derive(Debug)]
pub struct Entry {
    id: EntryId,
    state: EntryState,
    view: EntryView,
    kind: EntryKind,
}

impl Entry {
    pub fn say(id: EntryId, fragments: Vec<Fragment>) -> Self {
        Self::with_kind(
            id,
            EntryKind::Say(SayEntry {
                fragments,
                skipped: false,
            }),
        )
    }

    pub fn choice(id: EntryId) -> Self {
        Self::with_kind(id, EntryKind::Choice(ChoiceEntry::default()))
    }

    fn with_kind(id: EntryId, kind: EntryKind) -> Self {
        Self {
            id,
            state: EntryState::Created,
            view: EntryView::new(id),
            kind,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn view(&self) -> &EntryView {
        &self.view
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    pub fn as_say(&self) -> Option<&SayEntry> {
        match &self.kind {
            EntryKind::Say(say) => Some(say),
            EntryKind::Choice(_) => None,
        }
    }

    pub fn as_choice(&self) -> Option<&ChoiceEntry> {
        match &self.kind {
            EntryKind::Choice(choice) => Some(choice),
            EntryKind::Say(_) => None,
        }
    }

    pub(crate) fn kind_mut(&mut self) -> &mut EntryKind {
        &mut self.kind
    }

    /// Check the entry can be shown. A choice needs at least one option.
    pub fn validate(&self) -> Result<(), FeedError> {
        match &self.kind {
            EntryKind::Choice(choice) if choice.is_empty() => Err(FeedError::EmptyChoice(self.id)),
            _ => Ok(()),
        }
    }

    /// Fill the view from the entry's content.
    pub fn render(&mut self) {
        match &self.kind {
            EntryKind::Say(say) => {
                self.view.text = join_text(&say.fragments);
            }
            EntryKind::Choice(choice) => {
                self.view.items = choice
                    .choices
                    .iter()
                    .map(|c| ItemView {
                        text: join_text(&c.fragments),
                        selected: false,
                    })
                    .collect();
            }
        }
    }

    pub fn on_display(&mut self, ctx: &mut EntryContext<'_>) {
        self.state = EntryState::Displayed;
        match &mut self.kind {
            EntryKind::Say(say) => say.on_display(self.id, ctx),
            EntryKind::Choice(choice) => choice.read_choice(self.id, &mut self.view, ctx),
        }
    }

    pub fn on_short_action(&mut self, ctx: &mut EntryContext<'_>) {
        match &mut self.kind {
            EntryKind::Say(say) => say.on_short_action(ctx),
            EntryKind::Choice(choice) => choice.on_short_action(self.id, &mut self.view, ctx),
        }
    }

    pub fn on_long_action(&mut self, ctx: &mut EntryContext<'_>) {
        match &mut self.kind {
            EntryKind::Say(_) => {}
            EntryKind::Choice(choice) => choice.on_long_action(self.id, ctx),
        }
    }

    /// A press on this entry became a long press, so its short action will
    /// not fire.
    pub fn on_cancel_short_action(&mut self, _ctx: &mut EntryContext<'_>) {}

    pub fn on_end(&mut self) {
        self.state = EntryState::Ended;
    }

    /// Narration finished naturally. True if the feed should advance.
    pub fn on_narration_finished(&self) -> bool {
        match &self.kind {
            EntryKind::Say(say) => !say.skipped,
            EntryKind::Choice(_) => false,
        }
    }

    /// The confirmation sound for option `choice` finished. Returns the
    /// actions to run, which is empty for anything but the first
    /// confirmation of a choice.
    pub fn on_confirmed(&mut self, choice: usize) -> Vec<Action> {
        match &mut self.kind {
            EntryKind::Choice(entry) => entry.confirm(choice),
            EntryKind::Say(_) => Vec::new(),
        }
    }

    pub fn expire(&mut self) {
        self.state = EntryState::Expired;
        self.view.fading = true;
    }
}

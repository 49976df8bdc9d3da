/// The pending-entry queue and the script-facing builders that fill it.
use std::collections::VecDeque;

use crate::core::entry::{Action, Choice, Entry, EntryKind};
use crate::schema::fragment::{Content, Fragment};
use crate::schema::ids::{EntryId, Sequence};

/// FIFO of entries waiting to be displayed. Insertion order is display order.
#[derive(Debug, Default)]
pub struct FeedQueue {
    ids: Sequence,
    pending: VecDeque<Entry>,
}

impl FeedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a narrated line.
    pub fn say(&mut self, content: impl Into<Content>) -> SayHandle<'_> {
        let id = self.next_id();
        self.pending
            .push_back(Entry::say(id, content.into().into_fragments()));
        SayHandle { queue: self, id }
    }

    /// Enqueue an empty choice entry and return a builder for its options.
    /// At least one option must be added before the entry is displayed.
    pub fn choose(&mut self) -> ChoiceBuilder<'_> {
        let id = self.next_id();
        self.pending.push_back(Entry::choice(id));
        ChoiceBuilder { queue: self, id }
    }

    fn next_id(&mut self) -> EntryId {
        EntryId(self.ids.next())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn front(&self) -> Option<&Entry> {
        self.pending.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.pending.iter()
    }

    /// Number of entry ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.ids.issued()
    }

    pub(crate) fn pop_front(&mut self) -> Option<Entry> {
        self.pending.pop_front()
    }

    fn pending_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.pending.iter_mut().rev().find(|entry| entry.id() == id)
    }
}

/// Handle to a freshly enqueued say entry.
pub struct SayHandle<'a> {
    queue: &'a mut FeedQueue,
    id: EntryId,
}

impl SayHandle<'_> {
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Append another fragment, as long as the entry has not been displayed.
    pub fn and(self, fragment: impl Into<Fragment>) -> Self {
        if let Some(entry) = self.queue.pending_mut(self.id) {
            if let EntryKind::Say(say) = entry.kind_mut() {
                say.push(fragment.into());
            }
        }
        self
    }
}

/// Builder adding options to an enqueued choice entry.
pub struct ChoiceBuilder<'a> {
    queue: &'a mut FeedQueue,
    id: EntryId,
}

impl ChoiceBuilder<'_> {
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Add an option whose confirmation runs `action`.
    pub fn choice<F>(self, content: impl Into<Content>, action: F) -> Self
    where
        F: FnOnce(&mut FeedQueue) + 'static,
    {
        let action: Action = Box::new(action);
        self.choice_with(content, vec![action])
    }

    /// Add an option with no actions.
    pub fn option(self, content: impl Into<Content>) -> Self {
        self.choice_with(content, Vec::new())
    }

    /// Add an option with any number of actions, run in order on
    /// confirmation.
    pub fn choice_with(self, content: impl Into<Content>, actions: Vec<Action>) -> Self {
        if let Some(entry) = self.queue.pending_mut(self.id) {
            if let EntryKind::Choice(choice) = entry.kind_mut() {
                choice.push(Choice::new(content.into().into_fragments(), actions));
            }
        }
        self
    }
}

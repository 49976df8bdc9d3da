use serde::{Deserialize, Serialize};

use super::ids::EntryId;

/// The visual representation of one entry, as handed to the display surface.
///
/// A say entry renders as a paragraph of text; a choice entry renders as a
/// list with one item per choice and at most one item marked selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryView {
    pub entry: EntryId,
    pub anchor: String,
    pub text: String,
    #[serde(default)]
    pub items: Vec<ItemView>,
    #[serde(default)]
    pub fading: bool,
}

/// One list item of a choice view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub text: String,
    pub selected: bool,
}

impl EntryView {
    pub fn new(entry: EntryId) -> Self {
        Self {
            entry,
            anchor: entry.anchor(),
            text: String::new(),
            items: Vec::new(),
            fading: false,
        }
    }

    /// Clear every selected marker, then mark `index`.
    pub fn select(&mut self, index: usize) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.selected = i == index;
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.items.iter().position(|item| item.selected)
    }
}

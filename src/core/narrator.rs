/// Speech narrator: one narration stream at a time.
///
/// Starting a narration cancels everything queued before it. Each fragment
/// becomes one utterance; only the last utterance carries the completion.
use tracing::debug;

use crate::schema::command::Command;
use crate::schema::fragment::Fragment;
use crate::schema::ids::{Sequence, UtteranceId};

/// Outcome of [`Narrator::narrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narration {
    /// Utterances were queued; the completion is tied to `last`.
    Started { last: UtteranceId },
    /// Nothing to speak. The completion was dropped and will never fire.
    Silent,
}

#[derive(Debug)]
pub struct Narrator<C> {
    utterances: Sequence,
    tail: Option<(UtteranceId, Option<C>)>,
}

impl<C> Default for Narrator<C> {
    fn default() -> Self {
        Self {
            utterances: Sequence::new(),
            tail: None,
        }
    }
}

impl<C> Narrator<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn narrate(
        &mut self,
        fragments: &[Fragment],
        on_end: Option<C>,
        out: &mut Vec<Command>,
    ) -> Narration {
        self.cancel(out);

        let mut last = None;
        for fragment in fragments {
            let utterance = UtteranceId(self.utterances.next());
            out.push(Command::Speak {
                utterance,
                fragment: fragment.clone(),
            });
            last = Some(utterance);
        }

        match last {
            Some(last) => {
                self.tail = Some((last, on_end));
                Narration::Started { last }
            }
            None => {
                debug!("nothing to narrate, completion dropped");
                Narration::Silent
            }
        }
    }

    /// Stop all queued and playing speech. The pending completion, if any,
    /// is discarded.
    pub fn cancel(&mut self, out: &mut Vec<Command>) {
        out.push(Command::CancelSpeech);
        self.tail = None;
    }

    /// The host finished speaking an utterance. Returns the completion when
    /// it was the last utterance of the active narration.
    pub fn utterance_ended(&mut self, utterance: UtteranceId) -> Option<C> {
        let is_last = matches!(self.tail, Some((last, _)) if last == utterance);
        if is_last {
            return self.tail.take().and_then(|(_, token)| token);
        }
        debug!(utterance = utterance.0, "ignoring non-final or cancelled utterance");
        None
    }

    pub fn is_active(&self) -> bool {
        self.tail.is_some()
    }
}

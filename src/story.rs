//! Bundled presentation script: the welcome flow used by the web demo and
//! the preview tool.

use crate::core::queue::FeedQueue;

/// Enqueue the introduction. Declining at the second prompt loops back here.
pub fn intro(queue: &mut FeedQueue) {
    queue.say("Welcome to the game.");
    queue
        .choose()
        .choice("Press and hold anywhere to continue.", |queue| {
            queue.say("Great! Are you ready to move on?");
            queue
                .choose()
                .choice(
                    "No, take me back. Press anywhere to go to the next option.",
                    |queue| {
                        queue.say("Let's try again.");
                        intro(queue);
                    },
                )
                .choice(
                    "Yes, let's continue. Press and hold to confirm this option.",
                    |queue| {
                        queue.say("Then let us begin.");
                    },
                );
        });
}

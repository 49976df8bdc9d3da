/// Feed integration tests: gesture routing, entry lifecycle, and cleanup.

use narrative_feed::core::config::FeedConfig;
use narrative_feed::core::entry::{Action, EntryState};
use narrative_feed::core::feed::FeedController;
use narrative_feed::core::headless::HeadlessHost;
use narrative_feed::core::queue::FeedQueue;
use narrative_feed::core::sound::{Clip, Sound, SoundBank};
use narrative_feed::schema::command::Command;
use narrative_feed::schema::event::FeedEvent;
use narrative_feed::schema::ids::{EntryId, PlaybackId, TimerId, UtteranceId};
use narrative_feed::story;
use std::cell::RefCell;
use std::rc::Rc;

fn initialized() -> FeedController {
    let mut feed = FeedController::default();
    feed.initialize().unwrap();
    feed
}

fn utterances(commands: &[Command]) -> Vec<UtteranceId> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::Speak { utterance, .. } => Some(*utterance),
            _ => None,
        })
        .collect()
}

fn playbacks(commands: &[Command]) -> Vec<PlaybackId> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::PlayTone { playback, .. } | Command::PlayClip { playback, .. } => {
                Some(*playback)
            }
            _ => None,
        })
        .collect()
}

fn started_timer(commands: &[Command]) -> TimerId {
    commands
        .iter()
        .find_map(|c| match c {
            Command::StartTimer { timer, .. } => Some(*timer),
            _ => None,
        })
        .expect("press start should start a timer")
}

fn history_ids(feed: &FeedController) -> Vec<EntryId> {
    feed.history().map(|e| e.id()).collect()
}

/// Drain pending output, run a long action, and finish its confirmation
/// tone.
fn hold_to_confirm(feed: &mut FeedController) {
    feed.drain_commands();
    feed.long_action().unwrap();
    let confirm = playbacks(&feed.drain_commands());
    assert_eq!(confirm.len(), 1);
    feed.handle(FeedEvent::PlaybackEnded {
        playback: confirm[0],
    })
    .unwrap();
}

/// Enqueue a three-way choice whose actions record the chosen index.
fn three_way_choice(feed: &mut FeedController) -> Rc<RefCell<Vec<usize>>> {
    let fired = Rc::new(RefCell::new(Vec::new()));
    let mut builder = feed.choose();
    for index in 0..3 {
        let fired = Rc::clone(&fired);
        builder = builder.choice(format!("option {}", index), move |_| {
            fired.borrow_mut().push(index);
        });
    }
    fired
}

#[test]
fn hello_world_advances_on_narration_end() {
    let mut feed = initialized();
    feed.say("Hello");
    feed.say("World");

    feed.advance().unwrap();
    let first = utterances(&feed.drain_commands());
    feed.handle(FeedEvent::UtteranceEnded { utterance: first[0] })
        .unwrap();
    let second = utterances(&feed.drain_commands());
    feed.handle(FeedEvent::UtteranceEnded {
        utterance: second[0],
    })
    .unwrap();

    assert_eq!(history_ids(&feed), vec![EntryId(0), EntryId(1)]);
    assert_eq!(feed.queue_len(), 0);
    assert_eq!(feed.history().next().unwrap().view().text, "Hello");
}

#[test]
fn choice_confirms_selected_option_exactly_once() {
    let mut feed = initialized();
    let fired = three_way_choice(&mut feed);
    feed.advance().unwrap();

    feed.short_action().unwrap();
    feed.short_action().unwrap();
    assert_eq!(feed.current().unwrap().as_choice().unwrap().selected(), 2);
    feed.drain_commands();

    feed.long_action().unwrap();
    let confirm = playbacks(&feed.drain_commands());
    assert_eq!(confirm.len(), 1);
    feed.handle(FeedEvent::PlaybackEnded {
        playback: confirm[0],
    })
    .unwrap();
    assert_eq!(*fired.borrow(), vec![2]);

    // Nothing was enqueued, so the choice is still the gesture target.
    feed.long_action().unwrap();
    let again = playbacks(&feed.drain_commands());
    feed.handle(FeedEvent::PlaybackEnded { playback: again[0] })
        .unwrap();
    assert_eq!(*fired.borrow(), vec![2]);
    assert!(feed.current().unwrap().as_choice().unwrap().chosen());
}

#[test]
fn short_action_after_confirmation_keeps_selection() {
    let mut feed = initialized();
    three_way_choice(&mut feed);
    feed.advance().unwrap();
    feed.short_action().unwrap();
    hold_to_confirm(&mut feed);
    feed.drain_commands();

    feed.short_action().unwrap();
    let commands = feed.drain_commands();
    assert_eq!(feed.current().unwrap().as_choice().unwrap().selected(), 1);
    // Re-announces the confirmed option.
    assert!(commands.contains(&Command::Select {
        entry: EntryId(0),
        choice: 1
    }));
}

#[test]
fn actions_run_in_registration_order() {
    let mut feed = initialized();
    let log = Rc::new(RefCell::new(Vec::new()));
    let (a, b) = (Rc::clone(&log), Rc::clone(&log));
    let first: Action = Box::new(move |_: &mut FeedQueue| a.borrow_mut().push("first"));
    let second: Action = Box::new(move |_: &mut FeedQueue| b.borrow_mut().push("second"));
    feed.choose().choice_with("both", vec![first, second]);
    feed.advance().unwrap();
    hold_to_confirm(&mut feed);
    assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn confirmation_enqueues_and_displays_follow_up() {
    let mut feed = initialized();
    feed.choose().choice("go on", |queue| {
        queue.say("You went on.");
    });
    feed.advance().unwrap();
    hold_to_confirm(&mut feed);

    let current = feed.current().unwrap();
    assert_eq!(current.id(), EntryId(1));
    assert_eq!(current.view().text, "You went on.");
    assert_eq!(feed.entry_state(EntryId(0)), Some(EntryState::Ended));
}

#[test]
fn tap_during_confirmation_tone_keeps_held_option() {
    let mut feed = initialized();
    let fired = Rc::new(RefCell::new(Vec::new()));
    let (no, yes) = (Rc::clone(&fired), Rc::clone(&fired));
    feed.choose()
        .choice("No", move |_| no.borrow_mut().push(0))
        .choice("Yes", move |_| yes.borrow_mut().push(1));
    feed.advance().unwrap();
    feed.drain_commands();

    feed.handle(FeedEvent::PressStart).unwrap();
    let timer = started_timer(&feed.drain_commands());
    feed.handle(FeedEvent::TimerFired { timer }).unwrap();
    let confirm = *playbacks(&feed.drain_commands()).last().unwrap();
    feed.handle(FeedEvent::PressEnd).unwrap();

    // A quick tap lands before the confirmation tone ends.
    feed.handle(FeedEvent::PressStart).unwrap();
    feed.handle(FeedEvent::PressEnd).unwrap();
    assert_eq!(feed.current().unwrap().as_choice().unwrap().selected(), 1);

    feed.handle(FeedEvent::PlaybackEnded { playback: confirm })
        .unwrap();
    assert_eq!(*fired.borrow(), vec![0]);
}

#[test]
fn selection_cycle_with_single_choice_stays_at_zero() {
    let mut feed = initialized();
    feed.choose().option("only");
    feed.advance().unwrap();
    feed.short_action().unwrap();
    assert_eq!(feed.current().unwrap().as_choice().unwrap().selected(), 0);
}

#[test]
fn quick_press_skips_say() {
    let mut feed = initialized();
    feed.say("Hello");
    feed.say("World");
    feed.advance().unwrap();
    let hello = utterances(&feed.drain_commands());

    feed.handle(FeedEvent::PressStart).unwrap();
    feed.drain_commands();
    feed.handle(FeedEvent::PressEnd).unwrap();
    let commands = feed.drain_commands();
    assert!(commands.iter().any(|c| matches!(c, Command::CancelTimer { .. })));
    assert_eq!(feed.current().unwrap().id(), EntryId(1));
    assert!(feed.history().next().unwrap().as_say().unwrap().skipped());

    // The skipped line's narration end must not advance again.
    feed.say("Later");
    feed.handle(FeedEvent::UtteranceEnded { utterance: hello[0] })
        .unwrap();
    assert_eq!(feed.history_len(), 2);
    assert_eq!(feed.queue_len(), 1);
}

#[test]
fn held_press_fires_long_action_once() {
    let mut feed = initialized();
    three_way_choice(&mut feed);
    feed.advance().unwrap();
    feed.drain_commands();

    feed.handle(FeedEvent::PressStart).unwrap();
    let timer = started_timer(&feed.drain_commands());
    feed.handle(FeedEvent::TimerFired { timer }).unwrap();
    let long = feed.drain_commands();
    assert_eq!(playbacks(&long).len(), 1);
    assert!(!feed.long_press_pending());

    feed.handle(FeedEvent::PressEnd).unwrap();
    let release = feed.drain_commands();
    // Only the release tone; no short action, so no selection change.
    assert_eq!(playbacks(&release).len(), 1);
    assert!(!release.iter().any(|c| matches!(c, Command::Select { .. })));
    assert_eq!(feed.current().unwrap().as_choice().unwrap().selected(), 0);
}

#[test]
fn long_press_on_say_does_nothing() {
    let mut feed = initialized();
    feed.say("Hold on");
    feed.say("Next");
    feed.advance().unwrap();
    feed.long_action().unwrap();
    assert_eq!(feed.current().unwrap().id(), EntryId(0));
}

#[test]
fn new_narration_silences_previous_completion() {
    let mut feed = initialized();
    feed.say("A");
    feed.say("B");
    feed.say("C");
    feed.advance().unwrap();
    let a = utterances(&feed.drain_commands());
    feed.short_action().unwrap();
    let b_commands = feed.drain_commands();
    assert!(b_commands.contains(&Command::CancelSpeech));

    feed.handle(FeedEvent::UtteranceEnded { utterance: a[0] })
        .unwrap();
    assert_eq!(feed.current().unwrap().id(), EntryId(1));
    assert_eq!(feed.queue_len(), 1);
}

#[test]
fn history_is_bounded_and_evicts_oldest_first() {
    let mut feed = initialized();
    for i in 0..45 {
        feed.say(format!("line {}", i));
    }
    for _ in 0..45 {
        feed.advance().unwrap();
        assert!(feed.history_len() <= 40);
    }

    let fades: Vec<EntryId> = feed
        .drain_commands()
        .into_iter()
        .filter_map(|c| match c {
            Command::Fade { entry } => Some(entry),
            _ => None,
        })
        .collect();
    assert_eq!(fades, (0..5).map(EntryId).collect::<Vec<_>>());
    assert_eq!(history_ids(&feed).first(), Some(&EntryId(5)));
    assert_eq!(feed.entry_state(EntryId(0)), Some(EntryState::Expired));
    assert!(feed.history().next().is_some_and(|e| !e.view().fading));
}

#[test]
fn faded_entries_detach_after_settling_at_bottom() {
    let config = FeedConfig {
        history_limit: 2,
        ..FeedConfig::default()
    };
    let mut feed = FeedController::new(config).unwrap();
    feed.initialize().unwrap();
    for i in 0..4 {
        feed.say(format!("line {}", i));
        feed.advance().unwrap();
    }
    feed.drain_commands();

    feed.handle(FeedEvent::FadeEnded { entry: EntryId(0) }).unwrap();
    feed.handle(FeedEvent::FadeEnded { entry: EntryId(1) }).unwrap();
    feed.handle(FeedEvent::FadeEnded { entry: EntryId(1) }).unwrap();
    let requested = feed.drain_commands();
    assert_eq!(requested, vec![Command::RequestFrame]);
    assert_eq!(feed.pending_removal(), [EntryId(0), EntryId(1)]);

    // Scrolled up: nothing is removed no matter how long it takes.
    for _ in 0..10 {
        feed.handle(FeedEvent::Frame { at_bottom: false }).unwrap();
    }
    assert!(!feed
        .drain_commands()
        .iter()
        .any(|c| matches!(c, Command::Detach { .. })));

    for _ in 0..3 {
        feed.handle(FeedEvent::Frame { at_bottom: true }).unwrap();
    }
    let detached: Vec<EntryId> = feed
        .drain_commands()
        .into_iter()
        .filter_map(|c| match c {
            Command::Detach { entry } => Some(entry),
            _ => None,
        })
        .collect();
    assert_eq!(detached, vec![EntryId(0), EntryId(1)]);
    assert_eq!(feed.entry_state(EntryId(0)), Some(EntryState::Removed));
    assert_eq!(feed.expired_len(), 0);
    assert!(feed.pending_removal().is_empty());
}

#[test]
fn fade_for_displayed_entry_is_ignored() {
    let mut feed = initialized();
    feed.say("still here");
    feed.advance().unwrap();
    feed.drain_commands();
    feed.handle(FeedEvent::FadeEnded { entry: EntryId(0) }).unwrap();
    assert!(feed.drain_commands().is_empty());
}

#[test]
fn clip_palette_loads_before_announcing() {
    let config = FeedConfig {
        sounds: SoundBank {
            palette: vec![Sound::Clip(Clip::new("bell"))],
            ..SoundBank::default()
        },
        ..FeedConfig::default()
    };
    let mut feed = FeedController::new(config).unwrap();
    feed.initialize().unwrap();
    feed.choose().option("ring");
    feed.advance().unwrap();

    let commands = feed.drain_commands();
    let url = commands.iter().find_map(|c| match c {
        Command::FetchClip { url, .. } => Some(url.clone()),
        _ => None,
    });
    assert_eq!(url.as_deref(), Some("../assets/bell.mp3"));

    feed.handle(FeedEvent::ClipLoaded {
        clip: narrative_feed::schema::ids::ClipId("bell".into()),
    })
    .unwrap();
    let loaded = feed.drain_commands();
    assert!(matches!(loaded.as_slice(), [Command::PlayClip { .. }]));
    // The announcement callback was dropped while loading.
    feed.handle(FeedEvent::PlaybackEnded {
        playback: playbacks(&loaded)[0],
    })
    .unwrap();
    assert!(utterances(&feed.drain_commands()).is_empty());
}

#[test]
fn intro_script_runs_headless() {
    let mut feed = initialized();
    let mut host = HeadlessHost::new();
    story::intro(feed.queue_mut());
    feed.advance().unwrap();
    host.settle(&mut feed).unwrap();
    assert_eq!(
        host.take_spoken(),
        vec![
            "Welcome to the game.".to_string(),
            "Press and hold anywhere to continue.".to_string(),
        ]
    );

    host.hold(&mut feed).unwrap();
    assert_eq!(
        host.take_spoken(),
        vec![
            "Great! Are you ready to move on?".to_string(),
            "No, take me back. Press anywhere to go to the next option.".to_string(),
        ]
    );

    host.tap(&mut feed).unwrap();
    assert_eq!(
        host.take_spoken(),
        vec!["Yes, let's continue. Press and hold to confirm this option.".to_string()]
    );

    host.hold(&mut feed).unwrap();
    assert_eq!(host.take_spoken(), vec!["Then let us begin.".to_string()]);
    assert_eq!(feed.queue_len(), 0);
    assert_eq!(host.anchor(), Some("4"));
}

#[test]
fn intro_declined_loops_back() {
    let mut feed = initialized();
    let mut host = HeadlessHost::new();
    story::intro(feed.queue_mut());
    feed.advance().unwrap();
    host.settle(&mut feed).unwrap();
    host.hold(&mut feed).unwrap();
    host.take_spoken();

    host.hold(&mut feed).unwrap();
    assert_eq!(
        host.take_spoken(),
        vec![
            "Let's try again.".to_string(),
            "Welcome to the game.".to_string(),
            "Press and hold anywhere to continue.".to_string(),
        ]
    );
}

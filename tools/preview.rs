/// Preview: interactive terminal shell for stepping through a feed script.
///
/// Usage: preview [--config <path>]
///
/// Commands:
///   tap           : short press (skip a line, next option)
///   hold          : long press (confirm the selected option)
///   scroll up     : leave the bottom of the feed (pauses cleanup)
///   scroll down   : return to the bottom of the feed
///   history       : list displayed entries
///   help          : list commands
///   quit          : exit

use narrative_feed::core::config::FeedConfig;
use narrative_feed::core::entry::{Entry, EntryKind, EntryState};
use narrative_feed::core::feed::{FeedController, FeedError};
use narrative_feed::core::headless::HeadlessHost;
use narrative_feed::story;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return;
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(ref path) => match FeedConfig::load_from_ron(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => FeedConfig::default(),
    };

    let mut feed = match FeedController::new(config) {
        Ok(feed) => feed,
        Err(e) => {
            eprintln!("Error building feed: {}", e);
            std::process::exit(1);
        }
    };
    let mut host = HeadlessHost::new();

    if let Err(e) = start(&mut feed, &mut host) {
        eprintln!("Error starting feed: {}", e);
        std::process::exit(1);
    }
    print_spoken(&mut host);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("feed> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        let result = match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
                Ok(())
            }
            "tap" | "t" => host.tap(&mut feed),
            "hold" | "l" => host.hold(&mut feed),
            "scroll" => match parts.get(1).copied() {
                Some("up") => {
                    host.set_scrolled_up(true);
                    Ok(())
                }
                Some("down") => {
                    host.set_scrolled_up(false);
                    host.settle(&mut feed)
                }
                _ => {
                    println!("Usage: scroll up|down");
                    Ok(())
                }
            },
            "history" => {
                print_history(&feed, &host);
                Ok(())
            }
            _ => {
                println!("Unknown command: {}. Type 'help' for commands.", cmd);
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("Feed error: {}", e);
        }
        print_spoken(&mut host);
    }
}

fn start(feed: &mut FeedController, host: &mut HeadlessHost) -> Result<(), FeedError> {
    feed.initialize()?;
    story::intro(feed.queue_mut());
    feed.advance()?;
    host.settle(feed)
}

fn print_spoken(host: &mut HeadlessHost) {
    for line in host.take_spoken() {
        println!("  » {}", line);
    }
}

fn print_history(feed: &FeedController, host: &HeadlessHost) {
    println!(
        "{} displayed, {} queued, {} fading, {} attached",
        feed.history_len(),
        feed.queue_len(),
        feed.expired_len(),
        host.attached().len()
    );
    for entry in feed.history() {
        println!("  #{} {}", entry.id(), describe(entry));
    }
}

fn describe(entry: &Entry) -> String {
    let marker = match entry.state() {
        EntryState::Displayed => "*",
        _ => " ",
    };
    match entry.kind() {
        EntryKind::Say(_) => format!("{} {}", marker, entry.view().text),
        EntryKind::Choice(choice) => {
            let items: Vec<String> = entry
                .view()
                .items
                .iter()
                .map(|item| {
                    if item.selected {
                        format!("[{}]", item.text)
                    } else {
                        item.text.clone()
                    }
                })
                .collect();
            let status = if choice.chosen() { " (chosen)" } else { "" };
            format!("{} {}{}", marker, items.join(" | "), status)
        }
    }
}

fn print_usage() {
    println!("Usage: preview [--config <path>]");
    println!();
    println!("Steps through the bundled intro script in the terminal.");
    println!("Set RUST_LOG=narrative_feed=debug to trace the engine.");
}

fn print_help() {
    println!("Commands:");
    println!("  tap             short press (skip a line, next option)");
    println!("  hold            long press (confirm the selected option)");
    println!("  scroll up       leave the bottom of the feed (pauses cleanup)");
    println!("  scroll down     return to the bottom of the feed");
    println!("  history         list displayed entries");
    println!("  help            this message");
    println!("  quit            exit");
}

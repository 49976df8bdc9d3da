//! Narrative Feed: a narrated, press-driven story feed.
//!
//! Sequences spoken story beats and branching choices, ties them to
//! synthesized and sampled audio, and manages a bounded, scrolling history
//! with fade-out cleanup. The engine is host-agnostic: it consumes input and
//! completion events and emits display, audio, and speech commands.

pub mod core;
pub mod schema;
pub mod story;

pub use crate::core::config::FeedConfig;
pub use crate::core::feed::{FeedController, FeedError};
pub use crate::schema::command::Command;
pub use crate::schema::event::FeedEvent;
pub use crate::schema::fragment::{text, Fragment};

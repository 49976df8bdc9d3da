pub mod config;
pub mod entry;
pub mod feed;
pub mod headless;
pub mod narrator;
pub mod queue;
pub mod sound;
pub mod sweep;

pub mod command;
pub mod event;
pub mod fragment;
pub mod ids;
pub mod view;

//! Full-screen ratatui front end for the analytics assistant.

pub mod action;
pub mod app;
pub mod event;
pub mod theme;

pub use event::run_tui;

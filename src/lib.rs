//! Logic core for a clock / focus-timer widget: wall clock, pomodoro-style
//! countdown with break cycling, weather, theming, fullscreen presentation
//! state, and persisted settings. The binary drives it all from a single
//! one-second tick loop.

pub mod app;
pub mod clock;
pub mod config;
pub mod display;
pub mod state;
pub mod theme;
pub mod timer;
pub mod view;
pub mod weather;

//! Tracks keyboard and mouse input over a timed interval and reduces it to a single activity
//! percentage. Collection runs only while a session is open, scoring happens once when it closes.
//!

pub mod activity;
pub mod cli;
pub mod collector;
pub mod config;
pub mod session;
pub mod utils;

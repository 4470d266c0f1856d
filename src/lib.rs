//! TWLOG - Terminal Workout Log Library
//!
//! A terminal-based workout tracker with a map pane, built in Rust.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;

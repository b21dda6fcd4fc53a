//! Command-line front end for the medical document intake pipeline.

pub mod cli;
pub mod commands;
pub mod config;
pub mod picker;
pub mod session;
pub mod terminal;

pub use cli::{Cli, Commands};
pub use config::{IntakeConfig, OutputMode};
pub use terminal::TerminalSurface;

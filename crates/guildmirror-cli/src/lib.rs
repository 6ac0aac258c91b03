#![warn(missing_docs)]

//! guildmirror command line: configuration loading, interactive prompts and
//! the wiring between the terminal, the REST backend and the clone engine.

pub mod cli;
pub mod config;
pub mod prompt;

pub use config::{ClonerConfig, ConfigError, Settings};

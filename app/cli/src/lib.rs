//! Parley CLI application: renders prompts from request files and parses
//! model output for any supported model family.

pub use cmd::{Cli, Command};

pub mod cmd;
pub mod config;

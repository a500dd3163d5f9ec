//! CLI argument parsing and subcommand dispatch.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use compact_str::CompactString;
use pcore::ModelFamily;
use std::path::{Path, PathBuf};

pub mod inspect;
pub mod parse;
pub mod render;

/// Prompt/response protocol tooling.
#[derive(Parser, Debug)]
#[command(name = "parley", about = "Prompt/response protocol tooling")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Model family or model name, e.g. `harmony` or `Qwen3-8B`.
    #[arg(long, global = true, visible_alias = "model")]
    pub family: Option<CompactString>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble the prompt described by a request file.
    Render {
        /// Path to the TOML request file.
        request: PathBuf,
        /// Current date override.
        #[arg(long)]
        date: Option<String>,
        /// Print the prompt, stop sequences and tools as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Parse model output into segments.
    Parse {
        /// Output file, stdin when absent.
        file: Option<PathBuf>,
        /// Print the segments as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the output grammar detected in a file.
    Detect {
        /// Output file, stdin when absent.
        file: Option<PathBuf>,
    },
    /// Print the stop sequences of a family, or of every family.
    Labels,
}

impl Cli {
    /// The family named on the command line, if any.
    pub fn family(&self) -> Option<ModelFamily> {
        self.family.as_deref().map(ModelFamily::from)
    }

    /// Dispatch the parsed subcommand.
    pub fn run(self) -> Result<()> {
        let family = self.family();
        match self.command {
            Command::Render {
                request,
                date,
                json,
            } => render::run(&request, family, date, json),
            Command::Parse { file, json } => parse::run(file.as_deref(), family, json),
            Command::Detect { file } => inspect::detect(file.as_deref()),
            Command::Labels => inspect::labels(family),
        }
    }
}

/// Read a file, or stdin when no path is given.
pub(crate) fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin"),
    }
}

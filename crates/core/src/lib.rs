//! Core types for the parley prompt/response protocol layer.
//!
//! Holds the data model shared by prompt assembly and output parsing:
//! [`ModelFamily`], [`Segment`], [`ToolInvocation`], [`PromptConfiguration`],
//! the [`ToolCatalog`] and [`Clock`] collaborator traits, and the [`Error`]
//! taxonomy.

pub use {
    clock::{Clock, FixedClock, SystemClock},
    config::{PromptConfiguration, ReasoningEffort, Sampling},
    error::{Error, Result},
    family::ModelFamily,
    message::{Role, ToolCallRecord, ToolOutcome, Turn},
    segment::{Segment, SegmentKind, SegmentState},
    skill::{Skill, WorkspaceContext, WorkspaceSection},
    tool::{StaticCatalog, ToolCatalog, ToolCatalogEntry, ToolInvocation},
};

mod clock;
mod config;
mod error;
mod family;
mod message;
mod segment;
mod skill;
mod tool;

//! Conversation turns

use crate::{Segment, SegmentKind, ToolInvocation};
use serde::{Deserialize, Serialize};

/// A turn in the conversation
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Turn {
    /// The role of the turn
    pub role: Role,

    /// The plain content, used when there are no segments
    pub content: String,

    /// Segments parsed from a prior assistant output
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<Segment>,

    /// Tool calls made during the turn, with their outcome
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
}

impl Turn {
    /// Create a new user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            ..Default::default()
        }
    }

    /// Create a new assistant turn from plain text
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            ..Default::default()
        }
    }

    /// Create a new assistant turn from parsed segments
    pub fn segments(segments: Vec<Segment>) -> Self {
        Self {
            role: Role::Assistant,
            segments,
            ..Default::default()
        }
    }

    /// Record a tool call and its outcome
    pub fn with_tool_call(mut self, invocation: ToolInvocation, outcome: ToolOutcome) -> Self {
        self.tool_calls.push(ToolCallRecord {
            invocation,
            outcome,
        });
        self
    }

    /// The visible text of the turn
    ///
    /// Joins the final segments, falls back to the plain content.
    pub fn text(&self) -> String {
        let finals = self
            .segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Final)
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>();
        if finals.is_empty() {
            self.content.clone()
        } else {
            finals.join("\n")
        }
    }
}

/// A tool call made by the assistant, paired with what the tool returned
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolCallRecord {
    /// The call
    pub invocation: ToolInvocation,

    /// The result of executing the call
    pub outcome: ToolOutcome,
}

/// The result of executing a tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    /// The tool returned text
    Output(String),

    /// The tool failed
    Error(String),
}

impl ToolOutcome {
    /// The text rendered back to the model
    pub fn text(&self) -> String {
        match self {
            ToolOutcome::Output(output) => output.clone(),
            ToolOutcome::Error(error) => format!("error: {error}"),
        }
    }
}

/// The role of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
pub enum Role {
    /// The user role
    #[serde(rename = "user")]
    #[default]
    User,
    /// The assistant role
    #[serde(rename = "assistant")]
    Assistant,
}

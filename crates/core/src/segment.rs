//! Parsed output segments

use crate::ToolInvocation;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// The type of a parsed segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Chain of thought, hidden unless the caller preserves reasoning
    Reasoning,

    /// User-visible preamble or progress notes
    Commentary,

    /// The answer
    Final,

    /// A tool invocation body
    Tool,
}

/// Whether the terminator of a segment has been seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentState {
    /// The terminator arrived
    Closed,

    /// The buffer ended before the terminator
    #[default]
    Truncated,
}

/// One typed, ordered unit of model output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// The type of the segment
    pub kind: SegmentKind,

    /// The content with every protocol token stripped
    pub content: String,

    /// Emission order, strictly increasing within one parse
    pub order: u32,

    /// Closed or truncated
    #[serde(default)]
    pub state: SegmentState,

    /// The id of the resolved tool call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<CompactString>,

    /// The resolved tool call, tool segments only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolInvocation>,
}

impl Segment {
    /// Create a new segment
    pub fn new(kind: SegmentKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            order: 0,
            state: SegmentState::Closed,
            tool_call_id: None,
            tool: None,
        }
    }

    /// Create a reasoning segment
    pub fn reasoning(content: impl Into<String>) -> Self {
        Self::new(SegmentKind::Reasoning, content)
    }

    /// Create a commentary segment
    pub fn commentary(content: impl Into<String>) -> Self {
        Self::new(SegmentKind::Commentary, content)
    }

    /// Create a final segment
    pub fn final_answer(content: impl Into<String>) -> Self {
        Self::new(SegmentKind::Final, content)
    }

    /// Create a resolved tool segment, the content is the raw arguments
    pub fn tool(invocation: ToolInvocation) -> Self {
        Self {
            kind: SegmentKind::Tool,
            content: invocation.arguments.clone(),
            order: 0,
            state: SegmentState::Closed,
            tool_call_id: Some(invocation.id.clone()),
            tool: Some(invocation),
        }
    }

    /// Set the emission order
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Set the state
    pub fn with_state(mut self, state: SegmentState) -> Self {
        self.state = state;
        self
    }

    /// Attach a resolved invocation
    pub fn resolve(&mut self, invocation: ToolInvocation) {
        self.tool_call_id = Some(invocation.id.clone());
        self.tool = Some(invocation);
    }

    /// Whether the segment is shown to the user
    pub fn is_visible(&self) -> bool {
        matches!(self.kind, SegmentKind::Final | SegmentKind::Commentary)
    }

    /// A tool body whose recipient or call marker has not arrived yet
    pub fn is_pending(&self) -> bool {
        self.kind == SegmentKind::Tool && self.tool.is_none()
    }

    /// Whether the terminator has been seen
    pub fn is_closed(&self) -> bool {
        self.state == SegmentState::Closed
    }
}

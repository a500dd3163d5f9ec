//! Configuration for a prompt

use crate::{ModelFamily, Skill, Turn, WorkspaceContext};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Everything the assembler needs to encode one request
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptConfiguration {
    /// The dialect to encode for
    pub family: ModelFamily,

    /// The system instruction
    pub system: String,

    /// The conversation so far
    pub turns: Vec<Turn>,

    /// Sampling and limit knobs, passed through to the backend
    pub sampling: Sampling,

    /// The reasoning effort, if any
    pub reasoning: Option<ReasoningEffort>,

    /// Whether prior reasoning segments are replayed
    pub preserve_reasoning: bool,

    /// Whether to include a current date line
    pub include_current_date: bool,

    /// Current date override, the clock is read when absent
    pub current_date: Option<String>,

    /// The knowledge cutoff of the model
    pub knowledge_cutoff: Option<String>,

    /// Memory context block
    pub memory: Option<String>,

    /// Skills offered to the model
    pub skills: Vec<Skill>,

    /// Workspace context block
    pub workspace: Option<WorkspaceContext>,

    /// The requested tool ids
    pub tools: Vec<CompactString>,

    /// Whether tool access is restricted by policy
    ///
    /// When set, requested tools missing from the catalog are withheld
    /// instead of failing the request.
    pub tools_restricted: bool,
}

impl PromptConfiguration {
    /// Create a new configuration
    pub fn new(family: ModelFamily) -> Self {
        Self {
            family,
            ..Default::default()
        }
    }

    /// Set the system instruction
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    /// Append a turn
    pub fn turn(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self
    }

    /// Set the turns
    pub fn turns(mut self, turns: Vec<Turn>) -> Self {
        self.turns = turns;
        self
    }

    /// Request a tool
    pub fn tool(mut self, tool: impl Into<CompactString>) -> Self {
        self.tools.push(tool.into());
        self
    }

    /// Set the requested tools
    pub fn tools(mut self, tools: Vec<CompactString>) -> Self {
        self.tools = tools;
        self
    }

    /// Mark tool access as policy restricted
    pub fn restricted(mut self, restricted: bool) -> Self {
        self.tools_restricted = restricted;
        self
    }

    /// Set the reasoning effort
    pub fn reasoning(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning = Some(effort);
        self
    }

    /// Replay prior reasoning segments
    pub fn preserve_reasoning(mut self, preserve: bool) -> Self {
        self.preserve_reasoning = preserve;
        self
    }

    /// Include the current date, optionally overriding the clock
    pub fn current_date(mut self, date: Option<String>) -> Self {
        self.include_current_date = true;
        self.current_date = date;
        self
    }

    /// Set the knowledge cutoff
    pub fn knowledge_cutoff(mut self, cutoff: impl Into<String>) -> Self {
        self.knowledge_cutoff = Some(cutoff.into());
        self
    }

    /// Set the memory block
    pub fn memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = Some(memory.into());
        self
    }

    /// Offer a skill
    pub fn skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Set the workspace block
    pub fn workspace(mut self, workspace: WorkspaceContext) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// Set the sampling knobs
    pub fn sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }
}

/// Sampling and limit knobs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Sampling {
    /// The temperature of the model
    pub temperature: f32,

    /// The top probability of the model
    pub top_p: f32,

    /// The number of candidate tokens, 0 disables
    pub top_k: u32,

    /// The number of max tokens to generate
    pub max_tokens: usize,

    /// Extra stop sequences on top of the family's own
    pub stop: Vec<String>,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 1.0,
            top_k: 0,
            max_tokens: 4096,
            stop: Vec::new(),
        }
    }
}

/// How hard the model should think
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    /// Reasoning disabled where the family supports it
    Off,
    /// Low effort
    Low,
    /// Medium effort
    Medium,
    /// High effort
    High,
}

impl ReasoningEffort {
    /// The lowercase name of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Off => "off",
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

//! Skill and workspace context blocks.
//!
//! These are already-materialised values: providers fetch and merge them,
//! the assembler only renders them.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A named unit of agent behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Skill {
    /// Skill identifier.
    pub name: CompactString,
    /// Human-readable description.
    pub description: String,
    /// Skill body, rendered verbatim.
    pub body: String,
    /// Tool names this skill requires.
    pub tools: Vec<CompactString>,
}

impl Skill {
    /// Create a new skill with no tool requirements.
    pub fn new(name: impl Into<CompactString>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare a required tool.
    pub fn requires(mut self, tool: impl Into<CompactString>) -> Self {
        self.tools.push(tool.into());
        self
    }

    /// Whether the skill may be offered given the granted tools.
    ///
    /// A skill with no declared tools is always available.
    pub fn is_available<'a>(&self, granted: impl IntoIterator<Item = &'a CompactString>) -> bool {
        if self.tools.is_empty() {
            return true;
        }
        granted.into_iter().any(|tool| self.tools.contains(tool))
    }
}

/// Context about the workspace the agent operates in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkspaceContext {
    /// Named sections, rendered in order.
    pub sections: Vec<WorkspaceSection>,
}

impl WorkspaceContext {
    /// Add a section.
    pub fn section(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.sections.push(WorkspaceSection {
            title: title.into(),
            body: body.into(),
        });
        self
    }

    /// Whether there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// One titled section of workspace context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkspaceSection {
    /// Section title.
    pub title: String,
    /// Section body.
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::Skill;
    use compact_str::CompactString;

    #[test]
    fn skill_without_tools_is_available() {
        let skill = Skill::new("tone", "Be brief.");
        let granted: [CompactString; 0] = [];
        assert!(skill.is_available(&granted));
    }

    #[test]
    fn skill_requires_a_granted_tool() {
        let skill = Skill::new("forecast", "Check the sky.").requires("weather");
        let granted = [CompactString::from("search")];
        assert!(!skill.is_available(&granted));

        let granted = [CompactString::from("search"), CompactString::from("weather")];
        assert!(skill.is_available(&granted));
    }
}

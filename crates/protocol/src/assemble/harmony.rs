//! Harmony prompt renderer

use super::{Draft, Part, replay, typescript};
use crate::labels::ChannelTags;
use pcore::{Error, ReasoningEffort, Result, Role, ToolInvocation, ToolOutcome, Turn};

const CHANNELS: &str =
    "# Valid channels: analysis, commentary, final. Channel must be included for every message.";

const TOOL_ROUTE: &str = "Calls to these tools must go to the commentary channel: 'functions'.";

/// Namespace every function tool is declared in
pub(crate) const NAMESPACE: &str = "functions";

/// Render a Harmony prompt
pub(crate) fn render(draft: &Draft<'_>) -> Result<String> {
    let tags = draft
        .labels
        .channel
        .ok_or(Error::UnsupportedFamily(draft.labels.family))?;

    let mut formatter = Harmony {
        draft,
        tags,
        output: String::new(),
    };
    formatter.emit_system();
    formatter.emit_developer();
    for turn in &draft.config.turns {
        formatter.emit_turn(turn);
    }
    formatter.emit_complete();
    Ok(formatter.output)
}

struct Harmony<'a> {
    draft: &'a Draft<'a>,
    tags: ChannelTags,
    output: String,
}

impl Harmony<'_> {
    fn emit_system(&mut self) {
        let mut sections = Vec::new();
        if !self.draft.context.is_empty() {
            sections.push(self.draft.context.clone());
        }

        // harmony has no "off", the lowest effort stands in for it
        if let Some(effort) = self.draft.config.reasoning {
            let effort = match effort {
                ReasoningEffort::Off => ReasoningEffort::Low,
                effort => effort,
            };
            sections.push(format!("Reasoning: {}", effort.as_str()));
        }

        let mut channels = CHANNELS.to_owned();
        if !self.draft.tools.is_empty() {
            channels.push('\n');
            channels.push_str(TOOL_ROUTE);
        }
        sections.push(channels);

        let system = self.draft.labels.system.wrap(&sections.join("\n\n"));
        self.output.push_str(&system);
    }

    fn emit_developer(&mut self) {
        if self.draft.tools.is_empty() {
            return;
        }

        let body = format!(
            "# Tools\n\n## {NAMESPACE}\n\n{}",
            typescript::namespace(NAMESPACE, self.draft.tools)
        );
        match self.draft.labels.declarations {
            Some(developer) => self.output.push_str(&developer.wrap(&body)),
            None => self.output.push_str(&self.draft.labels.system.wrap(&body)),
        }
    }

    fn emit_turn(&mut self, turn: &Turn) {
        match turn.role {
            Role::User => {
                let user = self.draft.labels.user.wrap(&turn.content);
                self.output.push_str(&user);
            }
            Role::Assistant => {
                for part in replay(turn, self.draft.config.preserve_reasoning) {
                    match part {
                        Part::Reasoning(text) => self.emit_message("analysis", text),
                        Part::Commentary(text) => self.emit_message("commentary", text),
                        Part::Final(text) => self.emit_message("final", text),
                        Part::Call(invocation, outcome) => self.emit_call(invocation, outcome),
                    }
                }
            }
        }
    }

    /// `<|start|>assistant<|channel|>{channel}<|message|>{text}<|end|>`
    fn emit_message(&mut self, channel: &str, text: &str) {
        let assistant = self.draft.labels.assistant;
        self.output.push_str(&format!(
            "{}{}{channel}{}{}{}",
            assistant.open, self.tags.channel, self.tags.message, text, assistant.close
        ));
    }

    fn emit_call(&mut self, invocation: &ToolInvocation, outcome: Option<&ToolOutcome>) {
        let tags = self.tags;
        let recipient = format!("{NAMESPACE}.{}", invocation.recipient);
        self.output.push_str(&format!(
            "{}{}commentary {}{recipient} {}json{}{}{}",
            self.draft.labels.assistant.open,
            tags.channel,
            tags.recipient,
            tags.constrain,
            tags.message,
            invocation.arguments,
            tags.call,
        ));

        if let Some(outcome) = outcome {
            self.output.push_str(&format!(
                "{}{recipient} {}assistant{}commentary{}{}{}",
                tags.start,
                tags.recipient,
                tags.channel,
                tags.message,
                outcome.text(),
                tags.end,
            ));
        }
    }

    fn emit_complete(&mut self) {
        self.output.push_str(self.draft.labels.generation);
    }
}

//! Kimi prompt renderer

use super::{Draft, Exchange, Part, exchanges, function_json, replay};
use crate::labels::SectionTags;
use pcore::{Error, Result, Role, Turn};

/// Render a Kimi prompt
pub(crate) fn render(draft: &Draft<'_>) -> Result<String> {
    let section = draft
        .labels
        .section
        .ok_or(Error::UnsupportedFamily(draft.labels.family))?;
    if let Some(effort) = draft.config.reasoning {
        tracing::debug!("kimi has no reasoning control, ignoring effort {}", effort.as_str());
    }

    let mut formatter = Kimi {
        draft,
        section,
        output: String::new(),
    };
    formatter.emit_system();
    formatter.emit_declarations();
    for turn in &draft.config.turns {
        formatter.emit_turn(turn);
    }
    formatter.emit_complete();
    Ok(formatter.output)
}

struct Kimi<'a> {
    draft: &'a Draft<'a>,
    section: SectionTags,
    output: String,
}

impl Kimi<'_> {
    /// Tools are declared as a JSON array in their own block
    fn emit_declarations(&mut self) {
        if self.draft.tools.is_empty() {
            return;
        }

        let tools = self
            .draft
            .tools
            .iter()
            .map(function_json)
            .collect::<Vec<_>>();
        let body = format!("[{}]", tools.join(", "));
        let block = self.draft.labels.declarations.unwrap_or(self.draft.labels.system);
        self.output.push_str(&block.wrap(&body));
    }

    fn emit_system(&mut self) {
        if !self.draft.context.is_empty() {
            let system = self.draft.labels.system.wrap(&self.draft.context);
            self.output.push_str(&system);
        }
    }

    fn emit_turn(&mut self, turn: &Turn) {
        match turn.role {
            Role::User => {
                let user = self.draft.labels.user.wrap(&turn.content);
                self.output.push_str(&user);
            }
            Role::Assistant => {
                for exchange in exchanges(replay(turn, self.draft.config.preserve_reasoning)) {
                    self.emit_exchange(&exchange);
                }
            }
        }
    }

    /// Calls of one block share a single tool section
    fn emit_exchange(&mut self, exchange: &Exchange<'_>) {
        let labels = self.draft.labels;
        let mut body = String::new();
        let mut calls = String::new();
        for part in &exchange.parts {
            match part {
                Part::Reasoning(text) => match labels.reasoning {
                    Some(think) => body.push_str(&think.wrap(text.trim())),
                    None => tracing::debug!("kimi labels carry no reasoning delimiters"),
                },
                Part::Commentary(text) | Part::Final(text) => body.push_str(text.trim()),
                Part::Call(invocation, _) => calls.push_str(&format!(
                    "{}{}{}{}{}",
                    self.section.call_begin,
                    invocation.id,
                    self.section.argument_begin,
                    invocation.arguments,
                    self.section.call_end
                )),
            }
        }
        if !calls.is_empty() {
            body.push_str(self.section.begin);
            body.push_str(&calls);
            body.push_str(self.section.end);
        }
        self.output.push_str(&labels.assistant.wrap(&body));

        for (invocation, outcome) in &exchange.results {
            let result = format!("## Return of {}\n{}", invocation.id, outcome.text());
            self.output.push_str(&labels.tool_result.wrap(&result));
        }
    }

    fn emit_complete(&mut self) {
        self.output.push_str(self.draft.labels.generation);
    }
}

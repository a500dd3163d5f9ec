//! Llama 3 prompt renderer

use super::{Draft, Exchange, Part, exchanges, function_json, json_arguments, json_string, replay};
use pcore::{Role, Turn};

const TOOL_PREAMBLE: &str = "You have access to the following functions. \
To call a function, please respond with JSON for a function call. \
Respond in the format {\"name\": function name, \"parameters\": dictionary of argument name and its value}. \
Do not use variables.";

/// Render a Llama 3 prompt
pub(crate) fn render(draft: &Draft<'_>) -> String {
    if let Some(effort) = draft.config.reasoning {
        tracing::debug!("llama3 has no reasoning control, ignoring effort {}", effort.as_str());
    }

    let mut formatter = Llama3::new(draft);
    formatter.emit_begin();
    formatter.emit_system();
    for turn in &draft.config.turns {
        formatter.emit_turn(turn);
    }
    formatter.emit_complete();
    formatter.output
}

struct Llama3<'a> {
    draft: &'a Draft<'a>,
    output: String,
}

impl<'a> Llama3<'a> {
    fn new(draft: &'a Draft<'a>) -> Self {
        Self {
            draft,
            output: String::new(),
        }
    }

    fn emit_begin(&mut self) {
        self.output.push_str(self.draft.labels.begin);
    }

    /// Context first, then the tool environment and definitions
    fn emit_system(&mut self) {
        let mut body = self.draft.context.clone();
        if !self.draft.tools.is_empty() {
            if !body.is_empty() {
                body.push_str("\n\n");
            }
            body.push_str("Environment: ipython\n\n");
            body.push_str(TOOL_PREAMBLE);
            for tool in self.draft.tools {
                body.push_str("\n\n");
                body.push_str(&function_json(tool));
            }
        }

        if !body.is_empty() {
            self.output.push_str(&self.draft.labels.system.wrap(&body));
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

    /// A block ending in a call closes with the end-of-message token
    fn emit_exchange(&mut self, exchange: &Exchange<'_>) {
        let labels = self.draft.labels;
        let mut pieces = Vec::new();
        for part in &exchange.parts {
            match part {
                Part::Reasoning(_) => tracing::debug!("llama3 cannot replay reasoning, dropped"),
                Part::Commentary(text) | Part::Final(text) => pieces.push(text.trim().to_owned()),
                Part::Call(invocation, _) => {
                    let open = labels.tool_call.map(|tag| tag.open).unwrap_or_default();
                    pieces.push(format!(
                        r#"{open}{{"name": {}, "parameters": {}}}"#,
                        json_string(&invocation.recipient),
                        json_arguments(&invocation.arguments),
                    ));
                }
            }
        }

        let close = match labels.tool_call {
            Some(tag) if exchange.ends_with_call() => tag.close,
            _ => labels.assistant.close,
        };
        self.output.push_str(labels.assistant.open);
        self.output.push_str(&pieces.join("\n"));
        self.output.push_str(close);

        for (_, outcome) in &exchange.results {
            self.output.push_str(&labels.tool_result.wrap(&outcome.text()));
        }
    }

    fn emit_complete(&mut self) {
        self.output.push_str(self.draft.labels.generation);
    }
}

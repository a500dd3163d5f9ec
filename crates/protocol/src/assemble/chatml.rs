//! ChatML prompt renderer, shared by Qwen3 and unknown families

use super::{Draft, Exchange, Part, exchanges, function_json, json_arguments, json_string, replay};
use pcore::{ReasoningEffort, Role, Turn};

const TOOL_PREAMBLE: &str = "# Tools\n\n\
You may call one or more functions to assist with the user query.\n\n\
You are provided with function signatures within <tools></tools> XML tags:\n<tools>";

const TOOL_CONTRACT: &str = "</tools>\n\n\
For each function call, return a json object with function name and arguments \
within <tool_call></tool_call> XML tags:\n<tool_call>\n\
{\"name\": <function-name>, \"arguments\": <args-json-object>}\n</tool_call>";

/// Empty reasoning block that keeps Qwen3 from thinking
const EMPTY_THINK: &str = "<think>\n\n</think>\n\n";

/// Render a ChatML prompt
pub(crate) fn render(draft: &Draft<'_>) -> String {
    let mut formatter = ChatMl::new(draft);
    formatter.emit_system();
    for (idx, turn) in draft.config.turns.iter().enumerate() {
        formatter.emit_turn(idx, turn);
    }
    formatter.emit_complete();
    formatter.output
}

struct ChatMl<'a> {
    draft: &'a Draft<'a>,
    /// Directive for the reasoning toggle, Qwen3 only
    directive: Option<&'static str>,
    /// Index of the turn carrying the directive
    directive_turn: Option<usize>,
    output: String,
}

impl<'a> ChatMl<'a> {
    fn new(draft: &'a Draft<'a>) -> Self {
        let directive = match (draft.labels.directives, draft.config.reasoning) {
            (Some(directives), Some(ReasoningEffort::Off)) => Some(directives.no_think),
            (Some(directives), Some(_)) => Some(directives.think),
            (None, Some(effort)) => {
                tracing::debug!(
                    "{} has no reasoning control, ignoring effort {}",
                    draft.labels.family,
                    effort.as_str()
                );
                None
            }
            (_, None) => None,
        };

        Self {
            draft,
            directive,
            directive_turn: directive.and(draft.last_user()),
            output: String::new(),
        }
    }

    fn emit_system(&mut self) {
        let mut body = self.draft.context.clone();
        if !self.draft.tools.is_empty() {
            if !body.is_empty() {
                body.push_str("\n\n");
            }
            body.push_str(TOOL_PREAMBLE);
            for tool in self.draft.tools {
                body.push('\n');
                body.push_str(&function_json(tool));
            }
            body.push('\n');
            body.push_str(TOOL_CONTRACT);
        }

        // no user turn to carry the directive
        if let (Some(directive), None) = (self.directive, self.directive_turn) {
            if !body.is_empty() {
                body.push(' ');
            }
            body.push_str(directive);
        }

        if !body.is_empty() {
            self.output.push_str(&self.draft.labels.system.wrap(&body));
        }
    }

    fn emit_turn(&mut self, idx: usize, turn: &Turn) {
        match turn.role {
            Role::User => {
                let mut content = turn.content.clone();
                if let Some(directive) = self.directive.filter(|_| self.directive_turn == Some(idx))
                {
                    content.push(' ');
                    content.push_str(directive);
                }
                self.output.push_str(&self.draft.labels.user.wrap(&content));
            }
            Role::Assistant => {
                for exchange in exchanges(replay(turn, self.draft.config.preserve_reasoning)) {
                    self.emit_exchange(&exchange);
                }
            }
        }
    }

    /// Tool results of one block come back in a single user turn
    fn emit_exchange(&mut self, exchange: &Exchange<'_>) {
        let labels = self.draft.labels;
        let mut pieces = Vec::new();
        for part in &exchange.parts {
            match part {
                Part::Reasoning(text) => match labels.reasoning {
                    Some(think) => {
                        pieces.push(format!("{}\n{}\n{}\n", think.open, text.trim(), think.close))
                    }
                    None => tracing::debug!("{} cannot replay reasoning", labels.family),
                },
                Part::Commentary(text) | Part::Final(text) => pieces.push(text.trim().to_owned()),
                Part::Call(invocation, _) => {
                    let call = format!(
                        r#"{{"name": {}, "arguments": {}}}"#,
                        json_string(&invocation.recipient),
                        json_arguments(&invocation.arguments),
                    );
                    match labels.tool_call {
                        Some(tag) => pieces.push(format!("{}\n{call}\n{}", tag.open, tag.close)),
                        None => pieces.push(call),
                    }
                }
            }
        }
        self.output.push_str(&labels.assistant.wrap(&pieces.join("\n")));

        if !exchange.results.is_empty() {
            let results = exchange
                .results
                .iter()
                .map(|(_, outcome)| labels.tool_result.wrap(&outcome.text()))
                .collect::<Vec<_>>();
            self.output.push_str(&labels.user.wrap(&results.join("\n")));
        }
    }

    fn emit_complete(&mut self) {
        self.output.push_str(self.draft.labels.generation);
        if self.directive.is_some() && self.draft.config.reasoning == Some(ReasoningEffort::Off) {
            self.output.push_str(EMPTY_THINK);
        }
    }
}

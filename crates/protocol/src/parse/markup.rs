//! Markup-turn grammar
//!
//! `<think>…</think>` reasoning, `<tool_call>{json}</tool_call>` and
//! `<|python_tag|>{json}<|eom_id|>` calls, with plain text in between.
//! Delimiters are the union over every family emitting this grammar.

use super::{Call, Emitter, earliest};
use crate::{
    detect::{OutputGrammar, code_regions, find_outside, unmatched_fence},
    labels::{Delimiters, LabelRegistry, SectionTags},
};
use compact_str::CompactString;
use pcore::{SegmentKind, SegmentState};
use serde::Deserialize;
use serde_json::value::RawValue;

/// Delimiters of the markup grammar
pub(crate) struct Markup {
    reasoning: Vec<Delimiters>,
    calls: Vec<Delimiters>,
    /// End-of-turn tokens, parsing stops at the first one
    terminators: Vec<&'static str>,
    /// Echoed assistant headers, skipped
    headers: Vec<&'static str>,
    /// Call closers that also end the turn
    final_closers: Vec<&'static str>,
    /// Tool-section tags, handed back to the caller when met
    section: Option<SectionTags>,
}

/// Why a markup parse stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stop {
    /// The text ran out
    Exhausted,
    /// An end-of-turn token was reached
    EndOfTurn,
    /// A tool section opens at this offset
    Section(usize),
}

/// What the scanner found next in plain text
#[derive(Clone, Copy)]
enum Token {
    Reasoning(Delimiters),
    Call(Delimiters),
    Section(&'static str),
    Orphan(&'static str),
    Header(&'static str),
    Terminator(&'static str),
}

impl Token {
    fn text(&self) -> &'static str {
        match self {
            Token::Reasoning(pair) | Token::Call(pair) => pair.open,
            Token::Section(token)
            | Token::Orphan(token)
            | Token::Header(token)
            | Token::Terminator(token) => token,
        }
    }
}

impl Markup {
    /// Collect the delimiters of every markup family in `registry`
    ///
    /// Tool-section families share the markup grammar outside their
    /// section, so their labels are included.
    pub fn new(registry: &LabelRegistry) -> Self {
        let mut markup = Self {
            reasoning: Vec::new(),
            calls: Vec::new(),
            terminators: Vec::new(),
            headers: Vec::new(),
            final_closers: Vec::new(),
            section: None,
        };

        for labels in registry
            .emitting(OutputGrammar::MarkupTurn)
            .chain(registry.emitting(OutputGrammar::ToolSection))
        {
            push_unique(&mut markup.reasoning, labels.reasoning);
            push_unique(&mut markup.calls, labels.tool_call);
            push_unique(&mut markup.headers, Some(labels.generation));
            for stop in labels.stop {
                push_unique(&mut markup.terminators, Some(*stop));
            }
        }

        let closers = markup.calls.iter().map(|pair| pair.close).collect::<Vec<_>>();
        markup.final_closers = markup
            .terminators
            .iter()
            .copied()
            .filter(|token| closers.contains(token))
            .collect();
        markup.terminators.retain(|token| !closers.contains(token));
        markup
    }

    /// Stop at tool sections opened with `tags`
    pub fn with_section(mut self, tags: SectionTags) -> Self {
        self.section = Some(tags);
        self
    }

    /// Parse `text` into `out` up to the end of the turn or a tool section
    pub fn parse(&self, text: &str, out: &mut Emitter<'_>) -> Stop {
        let mut cursor = 0;
        while cursor <= text.len() {
            let rest = &text[cursor..];
            let Some((idx, token)) = self.next_token(rest) else {
                let trailing = out.hold_back(rest);
                out.text(SegmentKind::Final, trailing.trim(), SegmentState::Truncated);
                return Stop::Exhausted;
            };

            let body_start = idx + token.text().len();
            let body = &rest[body_start..];
            let end = match token {
                Token::Reasoning(pair) | Token::Call(pair) => self.body_end(body, pair.close),
                _ => None,
            };

            // an open fence may still turn this opener into code
            let opens_body = matches!(token, Token::Reasoning(_) | Token::Call(_));
            if opens_body && end.is_none() && unmatched_fence(&rest[..idx]).is_some() {
                out.text(SegmentKind::Final, rest[..idx].trim(), SegmentState::Truncated);
                return Stop::Exhausted;
            }

            out.text(SegmentKind::Final, rest[..idx].trim(), SegmentState::Closed);
            match (token, end) {
                (Token::Terminator(_), _) => return Stop::EndOfTurn,
                (Token::Section(_), _) => return Stop::Section(cursor + idx),
                (Token::Orphan(_) | Token::Header(_), _) => cursor += body_start,
                (Token::Reasoning(pair), Some((end, closer))) => {
                    out.text(SegmentKind::Reasoning, body[..end].trim(), SegmentState::Closed);
                    if closer != pair.close {
                        return Stop::EndOfTurn;
                    }
                    cursor += body_start + end + closer.len();
                }
                (Token::Reasoning(_), None) => {
                    let content = out.hold_back(body);
                    out.text(SegmentKind::Reasoning, content.trim(), SegmentState::Truncated);
                    return Stop::Exhausted;
                }
                (Token::Call(pair), Some((end, closer))) => {
                    let content = body[..end].trim();
                    out.tool(content, SegmentState::Closed, json_call(content));
                    if closer != pair.close || self.ends_turn(pair.close) {
                        return Stop::EndOfTurn;
                    }
                    cursor += body_start + end + closer.len();
                }
                (Token::Call(_), None) => {
                    let content = out.hold_back(body);
                    out.tool(content.trim(), SegmentState::Truncated, None);
                    return Stop::Exhausted;
                }
            }
        }
        Stop::Exhausted
    }

    /// The next token in plain text
    ///
    /// Fences pair up only within the text before the end of the turn, and
    /// openers inside a pair are skipped. Terminators count anywhere.
    fn next_token(&self, text: &str) -> Option<(usize, Token)> {
        let turn_end = self
            .terminators
            .iter()
            .chain(&self.final_closers)
            .filter_map(|token| text.find(token))
            .min()
            .unwrap_or(text.len());
        let regions = code_regions(&text[..turn_end]);

        let mut found: Option<(usize, Token)> = None;
        let mut consider = |needle: &'static str, token: Token, anywhere: bool| {
            let idx = if anywhere {
                text.find(needle)
            } else {
                find_outside(text, needle, &regions)
            };
            if let Some(idx) = idx {
                let better = match found {
                    None => true,
                    Some((best, current)) => {
                        idx < best || (idx == best && needle.len() > current.text().len())
                    }
                };
                if better {
                    found = Some((idx, token));
                }
            }
        };

        for pair in &self.reasoning {
            consider(pair.open, Token::Reasoning(*pair), false);
            consider(pair.close, Token::Orphan(pair.close), false);
        }
        for pair in &self.calls {
            consider(pair.open, Token::Call(*pair), false);
            if self.ends_turn(pair.close) {
                consider(pair.close, Token::Terminator(pair.close), true);
            } else {
                consider(pair.close, Token::Orphan(pair.close), false);
            }
        }
        if let Some(section) = self.section {
            consider(section.begin, Token::Section(section.begin), false);
            consider(section.call_begin, Token::Section(section.call_begin), false);
            consider(section.end, Token::Orphan(section.end), false);
            consider(section.call_end, Token::Orphan(section.call_end), false);
        }
        for &header in &self.headers {
            consider(header, Token::Header(header), false);
        }
        for &terminator in &self.terminators {
            consider(terminator, Token::Terminator(terminator), true);
        }
        found
    }

    /// End of a body: its closer, or an end-of-turn token
    fn body_end(&self, body: &str, close: &'static str) -> Option<(usize, &'static str)> {
        let mut needles = vec![close];
        needles.extend(self.terminators.iter().copied());
        earliest(body, &needles)
    }

    /// Whether a closer also ends the turn
    fn ends_turn(&self, close: &str) -> bool {
        self.final_closers.iter().any(|token| *token == close)
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: Option<T>) {
    match item {
        Some(item) if !items.contains(&item) => items.push(item),
        _ => {}
    }
}

/// `{"name": …, "arguments": …}`, `parameters` accepted for arguments
#[derive(Deserialize)]
struct JsonCall {
    name: CompactString,
    #[serde(alias = "parameters")]
    arguments: Option<Box<RawValue>>,
}

fn json_call(body: &str) -> Option<Call> {
    let call = match serde_json::from_str::<JsonCall>(body) {
        Ok(call) => call,
        Err(e) => {
            tracing::debug!("unresolved tool call body: {e}");
            return None;
        }
    };

    let arguments = call.arguments?;
    Some(Call {
        recipient: call.name,
        arguments: arguments.get().to_owned(),
        id: None,
    })
}

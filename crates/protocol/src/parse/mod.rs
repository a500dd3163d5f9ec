//! Streaming output parsing.
//!
//! The parser is stateless: every call re-derives the full segment list
//! from the buffer accumulated so far. Segments already returned for a
//! shorter buffer come back at the same index with the same kind, their
//! content possibly extended, so consumers can diff successive results
//! without flicker or duplicate tool dispatch.

use crate::{
    detect::{OutputGrammar, detect},
    labels::{HARMONY, LabelRegistry},
};
use compact_str::{CompactString, format_compact};
use pcore::{ModelFamily, Segment, SegmentKind, SegmentState, ToolInvocation, Turn};
use serde::Serialize;

mod channel;
mod markup;
mod section;

/// Parse `buffer` produced by a model of `family`
pub fn process(buffer: &str, family: ModelFamily) -> ParseResult {
    StreamingOutputParser::new(family).process(buffer)
}

/// Parser for one output stream
///
/// Holds no state between calls; feed it the whole buffer every time.
#[derive(Debug, Clone, Copy)]
pub struct StreamingOutputParser<'r> {
    family: ModelFamily,
    registry: &'r LabelRegistry,
}

impl StreamingOutputParser<'static> {
    /// Create a parser using the shared label registry
    pub fn new(family: ModelFamily) -> Self {
        Self::with_registry(family, LabelRegistry::shared())
    }
}

impl<'r> StreamingOutputParser<'r> {
    /// Create a parser reading tokens from `registry`
    pub fn with_registry(family: ModelFamily, registry: &'r LabelRegistry) -> Self {
        Self { family, registry }
    }

    /// The family hint
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Parse the buffer accumulated so far
    ///
    /// The grammar detected in the text wins over the family hint; the
    /// hint only matters when nothing is detected.
    pub fn process(&self, buffer: &str) -> ParseResult {
        let grammar = detect(buffer);
        let expected = OutputGrammar::of(self.family);
        if grammar != OutputGrammar::Unknown && expected != grammar {
            tracing::debug!(
                "{} model produced {grammar} output, expected {expected}",
                self.family
            );
        }

        let tokens = self.registry.tokens();
        let mut out = Emitter::new(&tokens);
        match grammar {
            OutputGrammar::TagChannel => {
                let tags = self
                    .registry
                    .labels_for(ModelFamily::Harmony)
                    .channel
                    .or(HARMONY.channel);
                match tags {
                    Some(tags) => channel::parse(buffer, tags, &mut out),
                    None => out.plain(buffer),
                }
            }
            // markup text may open a tool section the detector saw fenced
            OutputGrammar::MarkupTurn | OutputGrammar::ToolSection => {
                match self.registry.labels_for(ModelFamily::Kimi).section {
                    Some(tags) => section::parse(buffer, tags, self.registry, &mut out),
                    None => {
                        markup::Markup::new(self.registry).parse(buffer, &mut out);
                    }
                }
            }
            OutputGrammar::Unknown => out.plain(buffer),
        }

        ParseResult {
            grammar,
            segments: out.finish(),
        }
    }
}

/// The segments of one parse
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    /// The grammar detected in the buffer
    pub grammar: OutputGrammar,

    /// The segments in emission order
    pub segments: Vec<Segment>,
}

impl ParseResult {
    /// Final and commentary text, joined by newlines
    pub fn visible_text(&self) -> String {
        self.join(Segment::is_visible)
    }

    /// Reasoning text, joined by newlines
    pub fn reasoning(&self) -> String {
        self.join(|segment| segment.kind == SegmentKind::Reasoning)
    }

    /// Resolved tool calls in order
    pub fn tool_calls(&self) -> Vec<&ToolInvocation> {
        self.segments
            .iter()
            .filter_map(|segment| segment.tool.as_ref())
            .collect()
    }

    /// Every segment except reasoning
    pub fn without_reasoning(&self) -> Vec<&Segment> {
        self.segments
            .iter()
            .filter(|segment| segment.kind != SegmentKind::Reasoning)
            .collect()
    }

    /// Tool segments still waiting for their recipient or call marker
    pub fn pending_tools(&self) -> Vec<&Segment> {
        self.segments
            .iter()
            .filter(|segment| segment.is_pending())
            .collect()
    }

    /// Tool calls resolved since `previous` was parsed
    pub fn new_tool_calls(&self, previous: &ParseResult) -> Vec<&ToolInvocation> {
        let seen = previous.tool_calls();
        self.tool_calls()
            .into_iter()
            .filter(|call| !seen.iter().any(|old| old == call))
            .collect()
    }

    /// Whether every segment saw its terminator
    pub fn is_complete(&self) -> bool {
        self.segments.iter().all(Segment::is_closed)
    }

    fn join(&self, filter: impl Fn(&Segment) -> bool) -> String {
        self.segments
            .iter()
            .filter(|segment| filter(*segment))
            .map(|segment| segment.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<ParseResult> for Turn {
    fn from(result: ParseResult) -> Self {
        Turn::segments(result.segments)
    }
}

/// A tool call read from the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    /// The tool name
    pub recipient: CompactString,
    /// The raw arguments
    pub arguments: String,
    /// The id carried on the wire, if any
    pub id: Option<CompactString>,
}

/// Collects segments in emission order
pub(crate) struct Emitter<'t> {
    tokens: &'t [&'static str],
    segments: Vec<Segment>,
}

impl<'t> Emitter<'t> {
    fn new(tokens: &'t [&'static str]) -> Self {
        Self {
            tokens,
            segments: Vec::new(),
        }
    }

    /// Drop a trailing partial protocol token
    pub fn hold_back<'a>(&self, text: &'a str) -> &'a str {
        &text[..text.len() - partial_suffix(text, self.tokens)]
    }

    /// Emit a text segment, skipping blank content
    pub fn text(&mut self, kind: SegmentKind, content: &str, state: SegmentState) {
        if content.trim().is_empty() {
            return;
        }
        let order = self.next_order();
        self.segments
            .push(Segment::new(kind, content).with_order(order).with_state(state));
    }

    /// Emit a tool segment, resolved when `call` is known
    ///
    /// Calls without a wire id get `call_{n}`, `n` counting the tool
    /// segments before this one.
    pub fn tool(&mut self, content: &str, state: SegmentState, call: Option<Call>) {
        if content.trim().is_empty() && call.is_none() {
            return;
        }

        let index = self
            .segments
            .iter()
            .filter(|segment| segment.kind == SegmentKind::Tool)
            .count();
        let order = self.next_order();
        let mut segment = Segment::new(SegmentKind::Tool, content)
            .with_order(order)
            .with_state(state);
        if let Some(call) = call {
            let id = call.id.unwrap_or_else(|| format_compact!("call_{index}"));
            segment.resolve(ToolInvocation::new(call.recipient, call.arguments, id));
        }
        self.segments.push(segment);
    }

    /// The whole buffer as final text
    pub fn plain(&mut self, buffer: &str) {
        let content = self.hold_back(buffer);
        self.text(SegmentKind::Final, content.trim(), SegmentState::Truncated);
    }

    fn next_order(&self) -> u32 {
        u32::try_from(self.segments.len()).unwrap_or(u32::MAX)
    }

    fn finish(self) -> Vec<Segment> {
        self.segments
    }
}

/// Length of the longest suffix of `text` that starts some token
fn partial_suffix(text: &str, tokens: &[&str]) -> usize {
    let mut longest = 0;
    for token in tokens {
        for len in (longest + 1..token.len()).rev() {
            if token.is_char_boundary(len) && text.ends_with(&token[..len]) {
                longest = len;
                break;
            }
        }
    }
    longest
}

/// Earliest match of any needle, with the needle matched
///
/// Longer needles win ties.
pub(crate) fn earliest<'n>(text: &str, needles: &[&'n str]) -> Option<(usize, &'n str)> {
    needles
        .iter()
        .filter(|needle| !needle.is_empty())
        .filter_map(|needle| text.find(needle).map(|idx| (idx, *needle)))
        .min_by(|(a, x), (b, y)| a.cmp(b).then(y.len().cmp(&x.len())))
}

#[cfg(test)]
mod tests {
    use super::{earliest, partial_suffix};

    #[test]
    fn partial_suffix_finds_longest_token_prefix() {
        let tokens = ["<think>", "<|im_end|>"];
        assert_eq!(partial_suffix("hello <|im", &tokens), 4);
        assert_eq!(partial_suffix("hello <", &tokens), 1);
        assert_eq!(partial_suffix("hello <think>", &tokens), 0);
        assert_eq!(partial_suffix("hello", &tokens), 0);
    }

    #[test]
    fn earliest_prefers_longer_needle_on_tie() {
        let found = earliest("a <|start|>assistant", &["<|start|>", "<|start|>assistant"]);
        assert_eq!(found, Some((2, "<|start|>assistant")));
    }
}

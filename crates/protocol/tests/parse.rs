//! Tests for streaming output parsing.

use parley_protocol::{OutputGrammar, ParseResult, StreamingOutputParser, process};
use pcore::{ModelFamily, SegmentKind, SegmentState, Turn};

const HARMONY_CALL: &str = "<|channel|>analysis<|message|>Need the weather.<|end|>\
<|start|>assistant<|channel|>commentary to=functions.get_weather <|constrain|>json\
<|message|>{\"location\":\"Paris\"}<|call|>";

const QWEN_CALL: &str = "<think>\nNeed the weather.\n</think>\n\nLet me check.\n\
<tool_call>\n{\"name\": \"get_weather\", \"arguments\": {\"location\": \"Paris\"}}\n\
</tool_call><|im_end|>";

const KIMI_CALL: &str = "<think>Need the weather.</think>Checking.\
<|tool_calls_section_begin|><|tool_call_begin|>functions.get_weather:0\
<|tool_call_argument_begin|>{\"location\": \"Paris\"}<|tool_call_end|>\
<|tool_calls_section_end|>";

const LLAMA_CALL: &str = "Let me check.<|python_tag|>{\"name\": \"now\", \
\"parameters\": {\"tz\": \"UTC\"}}<|eom_id|>";

const KIMI_TEXT_FIRST: &str = "Checking.<|tool_calls_section_begin|>\
<|tool_call_begin|>functions.now:0<|tool_call_argument_begin|>{}<|tool_call_end|>\
<|tool_calls_section_end|>Done.";

const KIMI_FENCE_IN_THINK: &str = "<think>I could print ``` here</think>Checking.\
<|tool_calls_section_begin|><|tool_call_begin|>functions.get_weather:0\
<|tool_call_argument_begin|>{}<|tool_call_end|><|tool_calls_section_end|>";

const QWEN_STRAY_FENCE: &str = "<think>x</think>Use ``` to open a block.\
<tool_call>{\"name\": \"a\", \"arguments\": {}}</tool_call><|im_end|>";

fn kinds(result: &ParseResult) -> Vec<SegmentKind> {
    result.segments.iter().map(|segment| segment.kind).collect()
}

/// Every prefix parses into a prefix of the full parse
fn assert_stable(full: &str, family: ModelFamily) {
    let last = process(full, family);
    for end in (0..=full.len()).filter(|end| full.is_char_boundary(*end)) {
        let prefix = &full[..end];
        let partial = process(prefix, family);
        assert!(
            partial.segments.len() <= last.segments.len(),
            "prefix {prefix:?} has more segments than the full parse"
        );
        for (segment, settled) in partial.segments.iter().zip(&last.segments) {
            assert_eq!(segment.kind, settled.kind, "prefix {prefix:?}");
            assert_eq!(segment.order, settled.order, "prefix {prefix:?}");
            assert!(
                settled.content.starts_with(&segment.content),
                "prefix {prefix:?}: {:?} does not extend {:?}",
                settled.content,
                segment.content
            );
            assert!(!segment.content.contains("<|"), "prefix {prefix:?} leaked a token");
            if let Some(tool) = &segment.tool {
                assert_eq!(Some(tool), settled.tool.as_ref(), "prefix {prefix:?}");
            }
        }
    }
}

#[test]
fn harmony_reasoning_then_final() {
    let output = "<|channel|>analysis<|message|>The user asks for a sum.<|end|>\
                  <|start|>assistant<|channel|>final<|message|>2 + 2 equals 4.<|return|>";
    let result = process(output, ModelFamily::Harmony);
    assert_eq!(result.grammar, OutputGrammar::TagChannel);
    assert_eq!(kinds(&result), vec![SegmentKind::Reasoning, SegmentKind::Final]);
    assert_eq!(result.segments[1].content, "2 + 2 equals 4.");
    assert_eq!(result.segments[0].order, 0);
    assert_eq!(result.segments[1].order, 1);
    assert!(result.is_complete());
}

#[test]
fn harmony_commentary_without_recipient() {
    let output = "<|channel|>commentary<|message|>Looking it up.<|end|>";
    let result = process(output, ModelFamily::Harmony);
    assert_eq!(kinds(&result), vec![SegmentKind::Commentary]);
    assert_eq!(result.visible_text(), "Looking it up.");
}

#[test]
fn tool_call_resolves_when_call_marker_arrives() {
    let body = "<|start|>assistant<|channel|>commentary to=functions.get_weather \
                <|constrain|>json<|message|>{\"location\":\"Paris\"}";
    let first = process(body, ModelFamily::Harmony);
    assert_eq!(kinds(&first), vec![SegmentKind::Tool]);
    assert_eq!(first.segments[0].content, "{\"location\":\"Paris\"}");
    assert_eq!(first.segments[0].state, SegmentState::Truncated);
    assert!(first.segments[0].tool.is_none());
    assert_eq!(first.pending_tools().len(), 1);

    let second = process(&format!("{body}<|call|>"), ModelFamily::Harmony);
    assert_eq!(second.segments[0].content, first.segments[0].content);
    let call = second.segments[0].tool.as_ref().unwrap();
    assert_eq!(call.recipient, "get_weather");
    assert_eq!(call.arguments, "{\"location\":\"Paris\"}");
    assert_eq!(call.id, "call_0");
    assert_eq!(second.segments[0].tool_call_id.as_deref(), Some("call_0"));
    assert!(second.pending_tools().is_empty());
}

#[test]
fn tool_body_ended_without_call_marker_stays_pending() {
    let output = "<|start|>assistant<|channel|>commentary to=functions.get_weather \
                  <|message|>{}<|end|>";
    let result = process(output, ModelFamily::Harmony);
    assert_eq!(kinds(&result), vec![SegmentKind::Tool]);
    assert!(result.segments[0].is_pending());
    assert!(result.segments[0].is_closed());
}

#[test]
fn incomplete_header_emits_nothing() {
    let result = process("<|start|>assistant<|channel|>fin", ModelFamily::Harmony);
    assert!(result.segments.is_empty());
}

#[test]
fn harmony_parse_is_stable_under_growth() {
    assert_stable(HARMONY_CALL, ModelFamily::Harmony);
}

#[test]
fn markup_parse_is_stable_under_growth() {
    assert_stable(QWEN_CALL, ModelFamily::Qwen3);
}

#[test]
fn tool_section_parse_is_stable_under_growth() {
    assert_stable(KIMI_CALL, ModelFamily::Kimi);
}

#[test]
fn python_tag_parse_is_stable_under_growth() {
    assert_stable(LLAMA_CALL, ModelFamily::Llama3);
}

#[test]
fn text_then_tool_section_is_stable_under_growth() {
    assert_stable(KIMI_TEXT_FIRST, ModelFamily::Kimi);
    let result = process(KIMI_TEXT_FIRST, ModelFamily::Kimi);
    assert_eq!(
        kinds(&result),
        vec![SegmentKind::Final, SegmentKind::Tool, SegmentKind::Final]
    );
    assert_eq!(result.segments[2].content, "Done.");
}

#[test]
fn fence_inside_reasoning_does_not_hide_tool_section() {
    let result = process(KIMI_FENCE_IN_THINK, ModelFamily::Kimi);
    assert_eq!(result.grammar, OutputGrammar::ToolSection);
    assert_eq!(
        kinds(&result),
        vec![SegmentKind::Reasoning, SegmentKind::Final, SegmentKind::Tool]
    );
    assert_eq!(result.segments[1].content, "Checking.");
    let calls = result.tool_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].recipient, "get_weather");
    assert!(result.segments.iter().all(|segment| !segment.content.contains("<|")));
    assert_stable(KIMI_FENCE_IN_THINK, ModelFamily::Kimi);
}

#[test]
fn unmatched_fence_does_not_hide_tool_call() {
    let result = process(QWEN_STRAY_FENCE, ModelFamily::Qwen3);
    assert_eq!(
        kinds(&result),
        vec![SegmentKind::Reasoning, SegmentKind::Final, SegmentKind::Tool]
    );
    assert_eq!(result.segments[1].content, "Use ``` to open a block.");
    assert_eq!(result.tool_calls()[0].recipient, "a");
    assert!(result.is_complete());
    assert_stable(QWEN_STRAY_FENCE, ModelFamily::Qwen3);
}

#[test]
fn opener_after_open_fence_waits() {
    let partial = process("Example:\n```\n<tool_call>{\"name\"", ModelFamily::ChatMl);
    assert_eq!(kinds(&partial), vec![SegmentKind::Final]);
    assert_eq!(partial.segments[0].content, "Example:\n```");
    assert!(partial.pending_tools().is_empty());

    let example = "Example:\n```\n<tool_call>{\"name\": \"x\"}\n```\nDone.";
    assert_stable(example, ModelFamily::ChatMl);
    let result = process(example, ModelFamily::ChatMl);
    assert_eq!(kinds(&result), vec![SegmentKind::Final]);
    assert_eq!(result.segments[0].content, example);
}

#[test]
fn markup_reasoning_text_and_call() {
    let result = process(QWEN_CALL, ModelFamily::Qwen3);
    assert_eq!(result.grammar, OutputGrammar::MarkupTurn);
    assert_eq!(
        kinds(&result),
        vec![SegmentKind::Reasoning, SegmentKind::Final, SegmentKind::Tool]
    );
    assert_eq!(result.reasoning(), "Need the weather.");
    assert_eq!(result.visible_text(), "Let me check.");

    let calls = result.tool_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].recipient, "get_weather");
    assert_eq!(calls[0].arguments, "{\"location\": \"Paris\"}");
    assert_eq!(calls[0].id, "call_0");
}

#[test]
fn markup_call_without_arguments_stays_pending() {
    let result = process("<tool_call>{\"name\": \"now\"}</tool_call>", ModelFamily::ChatMl);
    assert_eq!(kinds(&result), vec![SegmentKind::Tool]);
    assert!(result.segments[0].is_pending());
}

#[test]
fn python_tag_call_accepts_parameters() {
    let output = "<|python_tag|>{\"name\": \"now\", \"parameters\": {}}<|eom_id|>";
    let result = process(output, ModelFamily::Llama3);
    let calls = result.tool_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].recipient, "now");
    assert_eq!(calls[0].arguments, "{}");
}

#[test]
fn end_of_turn_stops_parsing() {
    let result = process("Hello.<|eot_id|>ignored", ModelFamily::Llama3);
    assert_eq!(kinds(&result), vec![SegmentKind::Final]);
    assert_eq!(result.segments[0].content, "Hello.");
    assert_eq!(result.segments[0].state, SegmentState::Closed);
}

#[test]
fn echoed_assistant_header_is_skipped() {
    let result = process("<|im_start|>assistant\nHello<|im_end|>", ModelFamily::ChatMl);
    assert_eq!(kinds(&result), vec![SegmentKind::Final]);
    assert_eq!(result.segments[0].content, "Hello");
}

#[test]
fn orphan_closer_is_stripped() {
    let result = process("Thinking done.</think>The answer is 4.", ModelFamily::Qwen3);
    assert_eq!(kinds(&result), vec![SegmentKind::Final, SegmentKind::Final]);
    assert_eq!(result.segments[0].content, "Thinking done.");
    assert_eq!(result.segments[1].content, "The answer is 4.");
}

#[test]
fn partial_token_is_held_back() {
    let result = process("<think>ok</think>Hello <|im_en", ModelFamily::ChatMl);
    assert_eq!(result.segments[1].content, "Hello");
    assert_eq!(result.segments[1].state, SegmentState::Truncated);

    let plain = process("Hello <|chan", ModelFamily::Harmony);
    assert_eq!(plain.segments[0].content, "Hello");
}

#[test]
fn fenced_tags_are_text() {
    let output = "Use it like this:\n```\n<tool_call>{\"name\": \"x\", \"arguments\": {}}</tool_call>\n```\nDone.";
    let result = process(output, ModelFamily::ChatMl);
    assert_eq!(result.grammar, OutputGrammar::Unknown);
    assert_eq!(kinds(&result), vec![SegmentKind::Final]);
    assert!(result.tool_calls().is_empty());

    let mixed = "<think>ok</think>Example:\n```\n<think>\n```\nEnd.";
    let result = process(mixed, ModelFamily::Qwen3);
    assert_eq!(kinds(&result), vec![SegmentKind::Reasoning, SegmentKind::Final]);
    assert_eq!(result.segments[1].content, "Example:\n```\n<think>\n```\nEnd.");
}

#[test]
fn tool_section_calls_carry_wire_ids() {
    let result = process(KIMI_CALL, ModelFamily::Kimi);
    assert_eq!(result.grammar, OutputGrammar::ToolSection);
    assert_eq!(
        kinds(&result),
        vec![SegmentKind::Reasoning, SegmentKind::Final, SegmentKind::Tool]
    );
    let call = result.segments[2].tool.as_ref().unwrap();
    assert_eq!(call.recipient, "get_weather");
    assert_eq!(call.id, "functions.get_weather:0");
    assert_eq!(call.arguments, "{\"location\": \"Paris\"}");
}

#[test]
fn detected_grammar_wins_over_family() {
    let result = process(HARMONY_CALL, ModelFamily::ChatMl);
    assert_eq!(result.grammar, OutputGrammar::TagChannel);
    assert_eq!(result.tool_calls().len(), 1);
}

#[test]
fn unknown_output_is_one_final_segment() {
    let result = process("  just text  ", ModelFamily::Unknown);
    assert_eq!(result.grammar, OutputGrammar::Unknown);
    assert_eq!(kinds(&result), vec![SegmentKind::Final]);
    assert_eq!(result.segments[0].content, "just text");
    assert!(process("", ModelFamily::Unknown).segments.is_empty());
}

#[test]
fn new_tool_calls_report_each_call_once() {
    let second = "<|start|>assistant<|channel|>commentary to=functions.now <|constrain|>json\
                  <|message|>{}<|call|>";
    let parser = StreamingOutputParser::new(ModelFamily::Harmony);

    let empty = parser.process("");
    let one = parser.process(HARMONY_CALL);
    let two = parser.process(&format!("{HARMONY_CALL}{second}"));

    let fresh = one.new_tool_calls(&empty);
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].recipient, "get_weather");

    let fresh = two.new_tool_calls(&one);
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].recipient, "now");
    assert_eq!(fresh[0].id, "call_1");

    assert!(two.new_tool_calls(&two).is_empty());
}

#[test]
fn without_reasoning_drops_only_reasoning() {
    let result = process(QWEN_CALL, ModelFamily::Qwen3);
    let kept = result.without_reasoning();
    assert_eq!(kept.len(), 2);
    assert!(kept.iter().all(|segment| segment.kind != SegmentKind::Reasoning));
}

#[test]
fn result_converts_into_assistant_turn() {
    let result = process(QWEN_CALL, ModelFamily::Qwen3);
    let turn = Turn::from(result);
    assert_eq!(turn.segments.len(), 3);
    assert_eq!(turn.text(), "Let me check.");
}

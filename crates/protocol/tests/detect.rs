//! Tests for output grammar detection.

use parley_protocol::{OutputGrammar, code_regions, detect, find_outside_code};
use pcore::ModelFamily;

#[test]
fn detects_each_grammar() {
    assert_eq!(
        detect("<|channel|>final<|message|>hi"),
        OutputGrammar::TagChannel
    );
    assert_eq!(detect("<think>x</think>hi"), OutputGrammar::MarkupTurn);
    assert_eq!(detect("hi<|eot_id|>"), OutputGrammar::MarkupTurn);
    assert_eq!(
        detect("<|tool_call_begin|>functions.now:0"),
        OutputGrammar::ToolSection
    );
    assert_eq!(detect("plain text"), OutputGrammar::Unknown);
    assert_eq!(detect(""), OutputGrammar::Unknown);
}

#[test]
fn tool_section_outranks_tag_channel() {
    let text = "<|channel|>final<|message|>x<|tool_calls_section_begin|>";
    assert_eq!(detect(text), OutputGrammar::ToolSection);
}

#[test]
fn tag_channel_outranks_markup() {
    let text = "<think>a</think><|channel|>final<|message|>b";
    assert_eq!(detect(text), OutputGrammar::TagChannel);
}

#[test]
fn fenced_signatures_are_ignored() {
    let text = "Example:\n```\n<|channel|>final<|message|>hi\n```\n";
    assert_eq!(detect(text), OutputGrammar::Unknown);
}

#[test]
fn unmatched_fence_hides_nothing() {
    let text = "<think>I could print ``` here</think>Checking.<|tool_calls_section_begin|>";
    assert_eq!(detect(text), OutputGrammar::ToolSection);
    assert!(code_regions(text).is_empty());
}

#[test]
fn signature_after_fence_counts() {
    let text = "```\n<|channel|>\n```\n<think>real</think>";
    assert_eq!(detect(text), OutputGrammar::MarkupTurn);
}

#[test]
fn find_outside_code_skips_fences() {
    let text = "```<think>``` <think>";
    assert_eq!(find_outside_code(text, "<think>"), Some(14));
    assert_eq!(code_regions(text), vec![0..13]);
}

#[test]
fn family_grammars() {
    assert_eq!(
        OutputGrammar::of(ModelFamily::Harmony),
        OutputGrammar::TagChannel
    );
    assert_eq!(
        OutputGrammar::of(ModelFamily::Qwen3),
        OutputGrammar::MarkupTurn
    );
    assert_eq!(
        OutputGrammar::of(ModelFamily::Kimi),
        OutputGrammar::ToolSection
    );
    assert_eq!(
        OutputGrammar::of(ModelFamily::Speech),
        OutputGrammar::Unknown
    );
    assert_eq!(OutputGrammar::TagChannel.to_string(), "tag-channel");
}

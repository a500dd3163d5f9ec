//! Output grammar detection.
//!
//! Scans raw model output for family-specific signatures. Signatures that
//! only appear inside fenced code blocks do not count, so a model printing
//! an example of the tag syntax is not mistaken for using it.

use pcore::ModelFamily;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, ops::Range};

/// Code fence delimiter.
pub const FENCE: &str = "```";

const TOOL_SECTION: &[&str] = &["<|tool_calls_section_begin|>", "<|tool_call_begin|>"];

const TAG_CHANNEL: &[&str] = &["<|channel|>", "<|message|>", "<|start|>assistant"];

const MARKUP_TURN: &[&str] = &[
    "<think>",
    "</think>",
    "<tool_call>",
    "</tool_call>",
    "<|python_tag|>",
    "<|im_start|>",
    "<|im_end|>",
    "<|eot_id|>",
    "<|eom_id|>",
    "<|endoftext|>",
];

/// The output syntax present in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputGrammar {
    /// `<|tool_calls_section_begin|>` style tool sections.
    ToolSection,
    /// `<|channel|>` / `<|message|>` tagged channels.
    TagChannel,
    /// `<think>` / `<tool_call>` markup inside chat turns.
    MarkupTurn,
    /// No recognised signature.
    #[default]
    Unknown,
}

impl OutputGrammar {
    /// The grammar a family is expected to emit.
    pub fn of(family: ModelFamily) -> Self {
        match family {
            ModelFamily::Harmony => OutputGrammar::TagChannel,
            ModelFamily::ChatMl | ModelFamily::Qwen3 | ModelFamily::Llama3 => {
                OutputGrammar::MarkupTurn
            }
            ModelFamily::Kimi => OutputGrammar::ToolSection,
            ModelFamily::Diffusion | ModelFamily::Speech | ModelFamily::Unknown => {
                OutputGrammar::Unknown
            }
        }
    }

    /// The kebab-case name of the grammar.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputGrammar::ToolSection => "tool-section",
            OutputGrammar::TagChannel => "tag-channel",
            OutputGrammar::MarkupTurn => "markup-turn",
            OutputGrammar::Unknown => "unknown",
        }
    }
}

impl Display for OutputGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect which grammar is present in `text`.
///
/// Priority: tool-section, then tag-channel, then markup-turn.
pub fn detect(text: &str) -> OutputGrammar {
    let regions = code_regions(text);
    let present = |signatures: &[&str]| {
        signatures
            .iter()
            .any(|signature| contains_outside(text, signature, &regions))
    };

    if present(TOOL_SECTION) {
        OutputGrammar::ToolSection
    } else if present(TAG_CHANNEL) {
        OutputGrammar::TagChannel
    } else if present(MARKUP_TURN) {
        OutputGrammar::MarkupTurn
    } else {
        OutputGrammar::Unknown
    }
}

/// Byte ranges of fenced code in `text`.
///
/// Fences pair up in order. A fence without a closing partner opens no
/// region, see [`unmatched_fence`].
pub fn code_regions(text: &str) -> Vec<Range<usize>> {
    let mut regions = Vec::new();
    let mut open = None;
    for (idx, _) in text.match_indices(FENCE) {
        match open.take() {
            Some(start) => regions.push(start..idx + FENCE.len()),
            None => open = Some(idx),
        }
    }
    regions
}

/// Offset of the last fence in `text` when it has no closing partner.
pub(crate) fn unmatched_fence(text: &str) -> Option<usize> {
    let fences = text.match_indices(FENCE).map(|(idx, _)| idx).collect::<Vec<_>>();
    if fences.len() % 2 == 1 {
        fences.last().copied()
    } else {
        None
    }
}

/// First occurrence of `needle` in `text` that is not inside fenced code.
pub fn find_outside_code(text: &str, needle: &str) -> Option<usize> {
    let regions = code_regions(text);
    find_outside(text, needle, &regions)
}

/// First occurrence of `needle` outside `regions`.
pub(crate) fn find_outside(text: &str, needle: &str, regions: &[Range<usize>]) -> Option<usize> {
    text.match_indices(needle)
        .map(|(idx, _)| idx)
        .find(|idx| !regions.iter().any(|region| region.contains(idx)))
}

fn contains_outside(text: &str, needle: &str, regions: &[Range<usize>]) -> bool {
    find_outside(text, needle, regions).is_some()
}

#[cfg(test)]
mod tests {
    use super::{code_regions, unmatched_fence};

    #[test]
    fn regions_pair_fences() {
        let text = "a ```x``` b ```y";
        assert_eq!(code_regions(text), vec![2..9]);
        assert_eq!(unmatched_fence(text), Some(12));
        assert_eq!(unmatched_fence("a ```x``` b"), None);
    }

    #[test]
    fn no_fences_no_regions() {
        assert!(code_regions("plain text").is_empty());
    }
}

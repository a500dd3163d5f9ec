//! Prompt/response protocol layer.
//!
//! Encodes requests into the prompt dialect of a [`ModelFamily`] and
//! decodes raw, possibly partial, model output back into typed segments.
//!
//! - [`detect`] names the output grammar present in a buffer.
//! - [`LabelRegistry`] maps each family to its literal tokens.
//! - [`PromptAssembler`] builds prompts from a [`PromptConfiguration`].
//! - [`StreamingOutputParser`] splits output into [`Segment`]s.
//!
//! [`ModelFamily`]: pcore::ModelFamily
//! [`PromptConfiguration`]: pcore::PromptConfiguration
//! [`Segment`]: pcore::Segment

pub use {
    assemble::{Prompt, PromptAssembler, build},
    detect::{FENCE, OutputGrammar, code_regions, detect, find_outside_code},
    labels::{
        CHATML, ChannelTags, Delimiters, Directives, HARMONY, KIMI, LLAMA3, LabelRegistry,
        LabelSet, QWEN3, SectionTags, ToolGrammar,
    },
    parse::{ParseResult, StreamingOutputParser, process},
};

mod assemble;
mod detect;
mod labels;
mod parse;

//! Per-family delimiter tokens.
//!
//! A [`LabelSet`] holds every literal token one family uses: turn
//! boundaries, reasoning and tool-call delimiters, channel tags and stop
//! sequences. The [`LabelRegistry`] is an immutable table built once and
//! shared by reference.

use crate::detect::OutputGrammar;
use pcore::{Error, ModelFamily, Result};
use std::{collections::BTreeMap, sync::LazyLock};

static SHARED: LazyLock<LabelRegistry> = LazyLock::new(LabelRegistry::default);

/// An open/close token pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    /// Opening token
    pub open: &'static str,
    /// Closing token
    pub close: &'static str,
}

impl Delimiters {
    /// Create a new pair
    pub const fn new(open: &'static str, close: &'static str) -> Self {
        Self { open, close }
    }

    /// Wrap `content` in the pair
    pub fn wrap(&self, content: &str) -> String {
        format!("{}{content}{}", self.open, self.close)
    }
}

/// Tags of the tag-channel grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTags {
    /// Starts a message header
    pub start: &'static str,
    /// Introduces the channel name
    pub channel: &'static str,
    /// Ends the header, starts the body
    pub message: &'static str,
    /// Introduces the content type of a tool body
    pub constrain: &'static str,
    /// Ends a message
    pub end: &'static str,
    /// Ends a tool call message
    pub call: &'static str,
    /// Ends the final message of a turn
    pub ret: &'static str,
    /// Introduces the recipient in a header
    pub recipient: &'static str,
}

impl ChannelTags {
    /// Every tag, for holdback and stripping
    pub fn all(&self) -> [&'static str; 7] {
        [
            self.start,
            self.channel,
            self.message,
            self.constrain,
            self.end,
            self.call,
            self.ret,
        ]
    }
}

/// Tags of the tool-section grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionTags {
    /// Opens the section holding every call
    pub begin: &'static str,
    /// Closes the section
    pub end: &'static str,
    /// Opens one call, followed by its id
    pub call_begin: &'static str,
    /// Separates the id from the arguments
    pub argument_begin: &'static str,
    /// Closes one call
    pub call_end: &'static str,
}

impl SectionTags {
    /// Every tag, for holdback and stripping
    pub fn all(&self) -> [&'static str; 5] {
        [
            self.begin,
            self.end,
            self.call_begin,
            self.argument_begin,
            self.call_end,
        ]
    }
}

/// Trailing directives toggling reasoning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directives {
    /// Turns reasoning on
    pub think: &'static str,
    /// Turns reasoning off
    pub no_think: &'static str,
}

/// How a family declares its tools in the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolGrammar {
    /// TypeScript-like `namespace functions { … }`
    TypeScriptNamespace,
    /// One JSON object per line inside `<tools></tools>`
    JsonTags,
    /// JSON function list answered through `<|python_tag|>`
    PythonTag,
    /// JSON array inside a dedicated declaration block
    DeclareSection,
}

/// The literal tokens of one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    /// The family these labels belong to
    pub family: ModelFamily,
    /// Beginning-of-text token
    pub begin: &'static str,
    /// System block
    pub system: Delimiters,
    /// User block
    pub user: Delimiters,
    /// Assistant block
    pub assistant: Delimiters,
    /// Tool result block
    pub tool_result: Delimiters,
    /// Tool declaration block, when separate from the system block
    pub declarations: Option<Delimiters>,
    /// Opener appended at the end of the prompt
    pub generation: &'static str,
    /// Reasoning delimiters
    pub reasoning: Option<Delimiters>,
    /// Tool call delimiters
    pub tool_call: Option<Delimiters>,
    /// Channel tags
    pub channel: Option<ChannelTags>,
    /// Tool section tags
    pub section: Option<SectionTags>,
    /// Reasoning directives
    pub directives: Option<Directives>,
    /// Label of the current date line
    pub date_label: &'static str,
    /// Label of the knowledge cutoff line
    pub cutoff_label: &'static str,
    /// How tools are declared
    pub tool_grammar: ToolGrammar,
    /// Stop sequences passed to the backend
    pub stop: &'static [&'static str],
}

const THINK: Delimiters = Delimiters::new("<think>", "</think>");

/// gpt-oss labels
pub const HARMONY: LabelSet = LabelSet {
    family: ModelFamily::Harmony,
    begin: "",
    system: Delimiters::new("<|start|>system<|message|>", "<|end|>"),
    user: Delimiters::new("<|start|>user<|message|>", "<|end|>"),
    assistant: Delimiters::new("<|start|>assistant", "<|end|>"),
    tool_result: Delimiters::new("<|start|>", "<|end|>"),
    declarations: Some(Delimiters::new("<|start|>developer<|message|>", "<|end|>")),
    generation: "<|start|>assistant",
    reasoning: None,
    tool_call: None,
    channel: Some(ChannelTags {
        start: "<|start|>",
        channel: "<|channel|>",
        message: "<|message|>",
        constrain: "<|constrain|>",
        end: "<|end|>",
        call: "<|call|>",
        ret: "<|return|>",
        recipient: "to=",
    }),
    section: None,
    directives: None,
    date_label: "Current date",
    cutoff_label: "Knowledge cutoff",
    tool_grammar: ToolGrammar::TypeScriptNamespace,
    stop: &["<|return|>", "<|call|>"],
};

/// ChatML labels, also the permissive default
pub const CHATML: LabelSet = LabelSet {
    family: ModelFamily::ChatMl,
    begin: "",
    system: Delimiters::new("<|im_start|>system\n", "<|im_end|>\n"),
    user: Delimiters::new("<|im_start|>user\n", "<|im_end|>\n"),
    assistant: Delimiters::new("<|im_start|>assistant\n", "<|im_end|>\n"),
    tool_result: Delimiters::new("<tool_response>\n", "\n</tool_response>"),
    declarations: None,
    generation: "<|im_start|>assistant\n",
    reasoning: Some(THINK),
    tool_call: Some(Delimiters::new("<tool_call>", "</tool_call>")),
    channel: None,
    section: None,
    directives: None,
    date_label: "Current date",
    cutoff_label: "Knowledge cutoff",
    tool_grammar: ToolGrammar::JsonTags,
    stop: &["<|im_end|>", "<|endoftext|>"],
};

/// Qwen3 labels
pub const QWEN3: LabelSet = LabelSet {
    family: ModelFamily::Qwen3,
    directives: Some(Directives {
        think: "/think",
        no_think: "/no_think",
    }),
    ..CHATML
};

/// Llama 3 labels
pub const LLAMA3: LabelSet = LabelSet {
    family: ModelFamily::Llama3,
    begin: "<|begin_of_text|>",
    system: Delimiters::new(
        "<|start_header_id|>system<|end_header_id|>\n\n",
        "<|eot_id|>",
    ),
    user: Delimiters::new("<|start_header_id|>user<|end_header_id|>\n\n", "<|eot_id|>"),
    assistant: Delimiters::new(
        "<|start_header_id|>assistant<|end_header_id|>\n\n",
        "<|eot_id|>",
    ),
    tool_result: Delimiters::new(
        "<|start_header_id|>ipython<|end_header_id|>\n\n",
        "<|eot_id|>",
    ),
    declarations: None,
    generation: "<|start_header_id|>assistant<|end_header_id|>\n\n",
    reasoning: None,
    tool_call: Some(Delimiters::new("<|python_tag|>", "<|eom_id|>")),
    channel: None,
    section: None,
    directives: None,
    date_label: "Today Date",
    cutoff_label: "Cutting Knowledge Date",
    tool_grammar: ToolGrammar::PythonTag,
    stop: &["<|eot_id|>", "<|eom_id|>"],
};

/// Kimi labels
pub const KIMI: LabelSet = LabelSet {
    family: ModelFamily::Kimi,
    begin: "",
    system: Delimiters::new("<|im_system|>system<|im_middle|>", "<|im_end|>"),
    user: Delimiters::new("<|im_user|>user<|im_middle|>", "<|im_end|>"),
    assistant: Delimiters::new("<|im_assistant|>assistant<|im_middle|>", "<|im_end|>"),
    tool_result: Delimiters::new("<|im_system|>tool<|im_middle|>", "<|im_end|>"),
    declarations: Some(Delimiters::new(
        "<|im_system|>tool_declare<|im_middle|>",
        "<|im_end|>",
    )),
    generation: "<|im_assistant|>assistant<|im_middle|>",
    reasoning: Some(THINK),
    tool_call: None,
    channel: None,
    section: Some(SectionTags {
        begin: "<|tool_calls_section_begin|>",
        end: "<|tool_calls_section_end|>",
        call_begin: "<|tool_call_begin|>",
        argument_begin: "<|tool_call_argument_begin|>",
        call_end: "<|tool_call_end|>",
    }),
    directives: None,
    date_label: "Current date",
    cutoff_label: "Knowledge cutoff",
    tool_grammar: ToolGrammar::DeclareSection,
    stop: &["<|im_end|>"],
};

/// Immutable lookup table from family to labels
#[derive(Debug, Clone)]
pub struct LabelRegistry {
    labels: BTreeMap<ModelFamily, LabelSet>,
}

impl Default for LabelRegistry {
    fn default() -> Self {
        Self::new([HARMONY, CHATML, QWEN3, LLAMA3, KIMI])
    }
}

impl LabelRegistry {
    /// Build a registry from label sets, keyed by their family
    pub fn new(labels: impl IntoIterator<Item = LabelSet>) -> Self {
        Self {
            labels: labels
                .into_iter()
                .map(|label| (label.family, label))
                .collect(),
        }
    }

    /// The process-wide default registry
    pub fn shared() -> &'static LabelRegistry {
        &SHARED
    }

    /// Labels for any family, never fails
    ///
    /// Families without their own rendering resolve to the ChatML labels.
    /// Meant for output detection, where any family's output may arrive.
    pub fn labels_for(&self, family: ModelFamily) -> &LabelSet {
        self.labels
            .get(&family)
            .or_else(|| self.labels.get(&ModelFamily::ChatMl))
            .unwrap_or(&CHATML)
    }

    /// Labels for prompt assembly
    ///
    /// Fails for families dedicated to non-text modalities and for text
    /// families this registry has no labels for. `Unknown` renders with
    /// the ChatML labels.
    pub fn require_labels(&self, family: ModelFamily) -> Result<&LabelSet> {
        let labels = match family {
            ModelFamily::Diffusion | ModelFamily::Speech => None,
            ModelFamily::Unknown => self
                .labels
                .get(&family)
                .or_else(|| self.labels.get(&ModelFamily::ChatMl)),
            ModelFamily::Harmony
            | ModelFamily::ChatMl
            | ModelFamily::Qwen3
            | ModelFamily::Llama3
            | ModelFamily::Kimi => self.labels.get(&family),
        };
        labels.ok_or(Error::UnsupportedFamily(family))
    }

    /// Stop sequences of a family
    pub fn stop_sequences(&self, family: ModelFamily) -> &'static [&'static str] {
        self.labels_for(family).stop
    }

    /// Every label set, ordered by family
    pub fn iter(&self) -> impl Iterator<Item = &LabelSet> {
        self.labels.values()
    }

    /// Label sets whose families emit the given grammar
    pub fn emitting(&self, grammar: OutputGrammar) -> impl Iterator<Item = &LabelSet> {
        self.iter()
            .filter(move |labels| OutputGrammar::of(labels.family) == grammar)
    }

    /// Every literal protocol token known to the registry, sorted
    pub fn tokens(&self) -> Vec<&'static str> {
        let mut tokens = self
            .iter()
            .flat_map(LabelSet::tokens)
            .filter(|token| token.starts_with('<'))
            .collect::<Vec<_>>();
        tokens.sort_unstable();
        tokens.dedup();
        tokens
    }
}

impl LabelSet {
    /// The literal tokens of this set
    pub fn tokens(&self) -> Vec<&'static str> {
        let mut tokens = vec![self.begin, self.generation];
        for pair in [self.system, self.user, self.assistant, self.tool_result]
            .into_iter()
            .chain(self.declarations)
            .chain(self.reasoning)
            .chain(self.tool_call)
        {
            tokens.extend([pair.open, pair.close]);
        }
        if let Some(channel) = self.channel {
            tokens.extend(channel.all());
        }
        if let Some(section) = self.section {
            tokens.extend(section.all());
        }
        tokens.extend(self.stop.iter().copied());
        tokens.retain(|token| !token.trim().is_empty());
        tokens
    }
}

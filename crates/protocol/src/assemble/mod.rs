//! Prompt assembly.
//!
//! [`PromptAssembler::build`] validates the requested tools against the
//! catalog, renders the shared context block, then hands over to the
//! family renderer for turn boundaries, tool declarations and the
//! generation opener.

use crate::labels::{LabelRegistry, LabelSet};
use compact_str::CompactString;
use pcore::{
    Clock, Error, ModelFamily, PromptConfiguration, Result, Sampling, SegmentKind, SystemClock,
    ToolCatalog, ToolCatalogEntry, ToolInvocation, ToolOutcome, Turn,
};
use serde::Serialize;
use std::{collections::BTreeSet, fmt::Display, sync::Arc};

mod chatml;
mod harmony;
mod kimi;
mod llama;
mod typescript;

/// An assembled prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    /// The prompt text
    pub text: String,

    /// Stop sequences for the backend
    pub stop: Vec<String>,

    /// Tools declared in the prompt
    pub tools: Vec<CompactString>,

    /// Requested tools withheld because of policy
    pub withheld: Vec<CompactString>,

    /// Sampling knobs, passed through
    pub sampling: Sampling,
}

impl Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<Prompt> for String {
    fn from(prompt: Prompt) -> Self {
        prompt.text
    }
}

/// Builds prompts for any text family
#[derive(Clone)]
pub struct PromptAssembler {
    registry: Arc<LabelRegistry>,
    clock: Arc<dyn Clock>,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(Arc::new(LabelRegistry::default()))
    }
}

impl PromptAssembler {
    /// Create a new assembler reading the system clock
    pub fn new(registry: Arc<LabelRegistry>) -> Self {
        Self {
            registry,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use another date source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The label registry
    pub fn registry(&self) -> &LabelRegistry {
        &self.registry
    }

    /// Assemble the prompt for `config`
    pub fn build(&self, config: &PromptConfiguration, catalog: &impl ToolCatalog) -> Result<Prompt> {
        let labels = self.registry.require_labels(config.family)?;
        let (tools, withheld) = grant(config, catalog)?;
        let granted = tools.iter().map(|tool| tool.name.clone()).collect::<Vec<_>>();

        let draft = Draft {
            config,
            labels,
            context: self.context(config, labels, &granted),
            tools: &tools,
        };

        let text = match config.family {
            ModelFamily::Harmony => harmony::render(&draft)?,
            ModelFamily::ChatMl | ModelFamily::Qwen3 | ModelFamily::Unknown => {
                chatml::render(&draft)
            }
            ModelFamily::Llama3 => llama::render(&draft),
            ModelFamily::Kimi => kimi::render(&draft)?,
            ModelFamily::Diffusion | ModelFamily::Speech => {
                return Err(Error::UnsupportedFamily(config.family));
            }
        };

        tracing::debug!(
            "assembled {} prompt: {} bytes, {} turn(s), {} tool(s)",
            config.family,
            text.len(),
            config.turns.len(),
            granted.len()
        );

        Ok(Prompt {
            text,
            stop: stop_sequences(labels, &config.sampling),
            tools: granted,
            withheld,
            sampling: config.sampling.clone(),
        })
    }

    /// Render the shared context block
    ///
    /// System instruction, date, knowledge cutoff, workspace, skills and
    /// memory, in that order, separated by blank lines.
    fn context(
        &self,
        config: &PromptConfiguration,
        labels: &LabelSet,
        granted: &[CompactString],
    ) -> String {
        let mut sections = Vec::new();
        if !config.system.trim().is_empty() {
            sections.push(config.system.trim().to_owned());
        }

        let mut dates = Vec::new();
        if config.include_current_date {
            let date = config
                .current_date
                .clone()
                .unwrap_or_else(|| self.clock.today());
            dates.push(format!("{}: {date}", labels.date_label));
        }
        if let Some(cutoff) = &config.knowledge_cutoff {
            dates.push(format!("{}: {cutoff}", labels.cutoff_label));
        }
        if !dates.is_empty() {
            sections.push(dates.join("\n"));
        }

        if let Some(workspace) = config.workspace.as_ref().filter(|w| !w.is_empty()) {
            let mut block = String::from("# Workspace");
            for section in &workspace.sections {
                block.push_str(&format!(
                    "\n\n## {}\n{}",
                    section.title.trim(),
                    section.body.trim()
                ));
            }
            sections.push(block);
        }

        let skills = config
            .skills
            .iter()
            .filter(|skill| {
                let available = skill.is_available(granted);
                if !available {
                    tracing::debug!("skipping skill '{}', none of its tools granted", skill.name);
                }
                available
            })
            .collect::<Vec<_>>();
        if !skills.is_empty() {
            let mut block = String::from("# Skills");
            for skill in skills {
                block.push_str(&format!("\n\n## {}\n", skill.name));
                if !skill.description.trim().is_empty() {
                    block.push_str(skill.description.trim());
                    block.push_str("\n\n");
                }
                block.push_str(skill.body.trim());
            }
            sections.push(block);
        }

        if let Some(memory) = config.memory.as_deref().filter(|m| !m.trim().is_empty()) {
            sections.push(format!("# Memory\n\n{}", memory.trim()));
        }

        sections.join("\n\n")
    }
}

/// Assemble with the default registry and the system clock
pub fn build(config: &PromptConfiguration, catalog: &impl ToolCatalog) -> Result<Prompt> {
    PromptAssembler::default().build(config, catalog)
}

/// Inputs shared by the family renderers
pub(crate) struct Draft<'a> {
    /// The request
    pub config: &'a PromptConfiguration,
    /// The family labels
    pub labels: &'a LabelSet,
    /// The rendered context block, may be empty
    pub context: String,
    /// The granted tool definitions, in request order
    pub tools: &'a [ToolCatalogEntry],
}

impl Draft<'_> {
    /// Index of the last user turn
    pub fn last_user(&self) -> Option<usize> {
        self.config
            .turns
            .iter()
            .rposition(|turn| turn.role == pcore::Role::User)
    }
}

/// Check the requested tools against the catalog
///
/// Returns the granted definitions and the names withheld by policy.
fn grant(
    config: &PromptConfiguration,
    catalog: &impl ToolCatalog,
) -> Result<(Vec<ToolCatalogEntry>, Vec<CompactString>)> {
    if config.tools.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut ids = Vec::<CompactString>::with_capacity(config.tools.len());
    for id in &config.tools {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }

    let requested = ids.iter().cloned().collect::<BTreeSet<_>>();
    let provided = catalog.names();
    let missing = requested
        .difference(&provided)
        .cloned()
        .collect::<BTreeSet<_>>();

    let mut withheld = Vec::new();
    if !missing.is_empty() {
        if !config.tools_restricted {
            return Err(Error::ToolsNotAvailable { requested, missing });
        }

        withheld = ids
            .iter()
            .filter(|id| missing.contains(*id))
            .cloned()
            .collect();
        tracing::info!(
            "withholding {} tool(s) under restricted policy: {}",
            withheld.len(),
            withheld.join(", ")
        );
        ids.retain(|id| !missing.contains(id));
    }

    Ok((catalog.definitions_for(&ids), withheld))
}

/// The family's stop sequences followed by the caller's, deduplicated
fn stop_sequences(labels: &LabelSet, sampling: &Sampling) -> Vec<String> {
    let mut stop = Vec::<String>::new();
    for sequence in labels
        .stop
        .iter()
        .copied()
        .chain(sampling.stop.iter().map(String::as_str))
    {
        if !sequence.is_empty() && !stop.iter().any(|s| s == sequence) {
            stop.push(sequence.to_owned());
        }
    }
    stop
}

/// One replayed piece of an assistant turn
#[derive(Debug, Clone, Copy)]
pub(crate) enum Part<'a> {
    /// Prior reasoning, only when preserved
    Reasoning(&'a str),
    /// Commentary text
    Commentary(&'a str),
    /// Final text
    Final(&'a str),
    /// A resolved tool call and, if known, what it returned
    Call(&'a ToolInvocation, Option<&'a ToolOutcome>),
}

/// An assistant block followed by the results of its calls
#[derive(Debug, Default)]
pub(crate) struct Exchange<'a> {
    /// The assistant parts, calls last
    pub parts: Vec<Part<'a>>,
    /// Results of the calls in `parts`
    pub results: Vec<(&'a ToolInvocation, &'a ToolOutcome)>,
}

impl Exchange<'_> {
    /// Whether the block ends with a tool call
    pub fn ends_with_call(&self) -> bool {
        matches!(self.parts.last(), Some(Part::Call(..)))
    }
}

/// Re-emit the segments of an assistant turn in order
///
/// Resolved tool segments become calls paired with the matching record;
/// records not referenced by any segment are appended. Pending tool
/// segments are skipped. A turn without segments replays its content.
pub(crate) fn replay(turn: &Turn, preserve_reasoning: bool) -> Vec<Part<'_>> {
    let mut segments = turn.segments.iter().collect::<Vec<_>>();
    segments.sort_by_key(|segment| segment.order);

    let mut parts = Vec::new();
    let mut called = BTreeSet::new();
    for segment in segments {
        match segment.kind {
            SegmentKind::Reasoning if preserve_reasoning => {
                parts.push(Part::Reasoning(&segment.content))
            }
            SegmentKind::Reasoning => {}
            SegmentKind::Commentary => parts.push(Part::Commentary(&segment.content)),
            SegmentKind::Final => parts.push(Part::Final(&segment.content)),
            SegmentKind::Tool => match &segment.tool {
                Some(invocation) => {
                    called.insert(invocation.id.as_str());
                    parts.push(Part::Call(invocation, outcome(turn, &invocation.id)));
                }
                None => tracing::debug!("skipping pending tool segment {}", segment.order),
            },
        }
    }

    if turn.segments.is_empty() && !turn.content.is_empty() {
        parts.push(Part::Final(&turn.content));
    }

    for record in &turn.tool_calls {
        if !called.contains(record.invocation.id.as_str()) {
            parts.push(Part::Call(&record.invocation, Some(&record.outcome)));
        }
    }

    parts
}

fn outcome<'a>(turn: &'a Turn, id: &str) -> Option<&'a ToolOutcome> {
    turn.tool_calls
        .iter()
        .find(|record| record.invocation.id == id)
        .map(|record| &record.outcome)
}

/// Split replayed parts into assistant blocks at tool results
///
/// A block closes after its calls once any text follows them.
pub(crate) fn exchanges(parts: Vec<Part<'_>>) -> Vec<Exchange<'_>> {
    let mut exchanges = Vec::new();
    let mut current = Exchange::default();
    for part in parts {
        if current.ends_with_call() && !matches!(part, Part::Call(..)) {
            exchanges.push(std::mem::take(&mut current));
        }
        if let Part::Call(invocation, Some(outcome)) = part {
            current.results.push((invocation, outcome));
        }
        current.parts.push(part);
    }
    if !current.parts.is_empty() {
        exchanges.push(current);
    }
    exchanges
}

/// JSON description of one tool, keys in a fixed order
pub(crate) fn function_json(tool: &ToolCatalogEntry) -> String {
    format!(
        r#"{{"type": "function", "function": {{"name": {}, "description": {}, "parameters": {}}}}}"#,
        json_string(&tool.name),
        json_string(&tool.description),
        serde_json::to_string(&tool.parameters).unwrap_or_else(|_| "{}".to_owned()),
    )
}

/// Arguments embedded in a JSON call
///
/// Valid JSON is embedded verbatim, anything else as a JSON string.
pub(crate) fn json_arguments(arguments: &str) -> String {
    let trimmed = arguments.trim();
    if trimmed.is_empty() {
        "{}".to_owned()
    } else if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        trimmed.to_owned()
    } else {
        json_string(arguments)
    }
}

/// A JSON string literal
pub(crate) fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

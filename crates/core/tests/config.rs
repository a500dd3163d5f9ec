//! Tests for prompt configuration loading.

use parley_core::{ModelFamily, PromptConfiguration, ReasoningEffort, Role, ToolOutcome};

#[test]
fn parse_minimal_config() {
    let config: PromptConfiguration = toml::from_str(
        r#"
family = "harmony"
system = "You are helpful."
"#,
    )
    .unwrap();
    assert_eq!(config.family, ModelFamily::Harmony);
    assert_eq!(config.system, "You are helpful.");
    assert!(config.turns.is_empty());
    assert!(config.tools.is_empty());
    assert!(!config.include_current_date);
    assert_eq!(config.sampling.max_tokens, 4096);
}

#[test]
fn parse_full_config() {
    let config: PromptConfiguration = toml::from_str(
        r####"
family = "qwen3"
system = "You are helpful."
reasoning = "high"
include_current_date = true
current_date = "2026-10-19"
tools = ["weather"]
tools_restricted = true
memory = "The user lives in Paris."

[sampling]
temperature = 0.6
stop = ["###"]

[workspace]
sections = [{ title = "Repo", body = "parley" }]

[[skills]]
name = "forecast"
body = "Check the sky."
tools = ["weather"]

[[turns]]
role = "user"
content = "Weather?"

[[turns]]
role = "assistant"
content = "Let me check."

[[turns.tool_calls]]
invocation = { recipient = "weather", arguments = '{"city":"Paris"}', id = "call_0" }
outcome = { output = "sunny" }
"####,
    )
    .unwrap();
    assert_eq!(config.family, ModelFamily::Qwen3);
    assert_eq!(config.reasoning, Some(ReasoningEffort::High));
    assert_eq!(config.current_date.as_deref(), Some("2026-10-19"));
    assert!(config.tools_restricted);
    assert_eq!(config.sampling.temperature, 0.6);
    assert_eq!(config.sampling.stop, ["###"]);
    assert_eq!(config.workspace.unwrap().sections[0].title, "Repo");
    assert_eq!(config.skills[0].tools[0], "weather");
    assert_eq!(config.turns.len(), 2);
    assert_eq!(config.turns[1].role, Role::Assistant);
    let record = &config.turns[1].tool_calls[0];
    assert_eq!(record.invocation.recipient, "weather");
    assert_eq!(record.outcome, ToolOutcome::Output("sunny".into()));
}

#[test]
fn builder_sets_fields() {
    let config = PromptConfiguration::new(ModelFamily::Llama3)
        .system("Be terse.")
        .tool("search")
        .restricted(true)
        .current_date(None)
        .knowledge_cutoff("2023-12");
    assert_eq!(config.family, ModelFamily::Llama3);
    assert_eq!(config.tools, ["search"]);
    assert!(config.tools_restricted);
    assert!(config.include_current_date);
    assert!(config.current_date.is_none());
    assert_eq!(config.knowledge_cutoff.as_deref(), Some("2023-12"));
}

#[test]
fn tool_outcome_text() {
    assert_eq!(ToolOutcome::Output("42".into()).text(), "42");
    assert_eq!(ToolOutcome::Error("timeout".into()).text(), "error: timeout");
}

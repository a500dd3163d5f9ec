//! Tests for CLI command output.

use parley_cli::cmd::parse::describe;
use pcore::ModelFamily;
use protocol::process;

#[test]
fn describe_resolved_call() {
    let output = "<tool_call>{\"name\": \"now\", \"arguments\": {}}</tool_call>";
    let result = process(output, ModelFamily::ChatMl);
    assert_eq!(describe(&result.segments[0]), "[0] tool call_0 -> now\n{\"name\": \"now\", \"arguments\": {}}");
}

#[test]
fn describe_truncated_text() {
    let result = process("<think>Adding.</think>2 + 2", ModelFamily::Qwen3);
    assert_eq!(describe(&result.segments[0]), "[0] reasoning\nAdding.");
    assert_eq!(describe(&result.segments[1]), "[1] final (truncated)\n2 + 2");
}

#[test]
fn describe_pending_call() {
    let result = process("<tool_call>{\"name\": \"no", ModelFamily::ChatMl);
    assert_eq!(describe(&result.segments[0]), "[0] tool (truncated) (pending)\n{\"name\": \"no");
}

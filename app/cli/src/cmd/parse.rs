//! Output parsing command.

use super::read_input;
use anyhow::Result;
use pcore::{ModelFamily, Segment, SegmentKind, SegmentState};
use protocol::process;
use std::path::Path;

/// Parse model output and print its segments.
pub fn run(path: Option<&Path>, family: Option<ModelFamily>, json: bool) -> Result<()> {
    let buffer = read_input(path)?;
    let result = process(&buffer, family.unwrap_or_default());
    tracing::debug!(
        "parsed {} segment(s) as {}",
        result.segments.len(),
        result.grammar
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for segment in &result.segments {
        println!("{}", describe(segment));
    }
    Ok(())
}

/// One line header plus the content of a segment.
pub fn describe(segment: &Segment) -> String {
    let kind = match segment.kind {
        SegmentKind::Reasoning => "reasoning",
        SegmentKind::Commentary => "commentary",
        SegmentKind::Final => "final",
        SegmentKind::Tool => "tool",
    };
    let mut header = format!("[{}] {kind}", segment.order);
    if segment.state == SegmentState::Truncated {
        header.push_str(" (truncated)");
    }
    match (&segment.tool, segment.kind) {
        (Some(call), _) => header.push_str(&format!(" {} -> {}", call.id, call.recipient)),
        (None, SegmentKind::Tool) => header.push_str(" (pending)"),
        _ => {}
    }
    format!("{header}\n{}", segment.content)
}

//! Prompt rendering command.

use crate::config::RequestFile;
use anyhow::{Context, Result};
use pcore::ModelFamily;
use protocol::PromptAssembler;
use std::path::Path;

/// Render the request at `path` and print the prompt.
pub fn run(path: &Path, family: Option<ModelFamily>, date: Option<String>, json: bool) -> Result<()> {
    let mut file = RequestFile::load(path)?;
    if let Some(family) = family {
        file.request.family = family;
    }
    if date.is_some() {
        file.request = file.request.current_date(date);
    }

    let catalog = file.catalog();
    let prompt = PromptAssembler::default()
        .build(&file.request, &catalog)
        .with_context(|| format!("failed to render {}", path.display()))?;
    if !prompt.withheld.is_empty() {
        tracing::warn!("withheld tools: {}", prompt.withheld.join(", "));
    }

    if json {
        let output = serde_json::json!({
            "text": prompt.text,
            "stop": prompt.stop,
            "tools": prompt.tools,
            "withheld": prompt.withheld,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{prompt}");
    }
    Ok(())
}

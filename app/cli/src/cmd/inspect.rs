//! Detection and label inspection commands.

use super::read_input;
use anyhow::Result;
use pcore::ModelFamily;
use protocol::LabelRegistry;
use std::path::Path;

/// Print the grammar detected in the input.
pub fn detect(path: Option<&Path>) -> Result<()> {
    let buffer = read_input(path)?;
    println!("{}", protocol::detect(&buffer));
    Ok(())
}

/// Print stop sequences, one family per line.
pub fn labels(family: Option<ModelFamily>) -> Result<()> {
    let registry = LabelRegistry::shared();
    let families = match family {
        Some(family) => vec![family],
        None => ModelFamily::ALL.to_vec(),
    };

    for family in families {
        if !family.is_text() {
            println!("{family}: (no prompt rendering)");
            continue;
        }
        println!("{family}: {}", registry.stop_sequences(family).join(" "));
    }
    Ok(())
}

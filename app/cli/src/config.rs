//! Request files for the CLI.
//!
//! A request file is TOML with a `[request]` table holding the prompt
//! configuration and a `[[tools]]` array holding the catalog:
//!
//! ```toml
//! [request]
//! family = "qwen3"
//! system = "You are a helpful assistant."
//! tools = ["get_weather"]
//!
//! [[request.turns]]
//! role = "user"
//! content = "Weather in Paris?"
//!
//! [[tools]]
//! name = "get_weather"
//! description = "Gets the weather"
//! parameters = { type = "object", properties = { location = { type = "string" } } }
//! ```

use anyhow::{Context, Result};
use pcore::{PromptConfiguration, StaticCatalog, ToolCatalogEntry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A prompt request with its tool catalog.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestFile {
    /// The prompt configuration.
    pub request: PromptConfiguration,
    /// Tool definitions available to the request.
    pub tools: Vec<ToolCatalogEntry>,
}

impl RequestFile {
    /// Parse a TOML string into a `RequestFile`.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let file: Self = toml::from_str(toml_str)?;
        Ok(file)
    }

    /// Load a request file from a path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// The tools as a catalog.
    pub fn catalog(&self) -> StaticCatalog {
        self.tools.iter().cloned().collect()
    }
}

//! Tool abstractions shared by the assembler and the parser

use compact_str::CompactString;
use schemars::Schema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A tool the model may call
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolCatalogEntry {
    /// The name of the tool
    pub name: CompactString,

    /// The description of the tool
    #[serde(default)]
    pub description: String,

    /// The JSON schema of the arguments
    #[serde(default = "empty_object")]
    pub parameters: Schema,
}

impl ToolCatalogEntry {
    /// Create a new catalog entry
    pub fn new(
        name: impl Into<CompactString>,
        description: impl Into<String>,
        parameters: Schema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

fn empty_object() -> Schema {
    schemars::json_schema!({ "type": "object", "properties": {} })
}

/// A resolved request to call a named tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ToolInvocation {
    /// The name of the tool
    pub recipient: CompactString,

    /// The raw arguments, forwarded verbatim
    #[serde(default)]
    pub arguments: String,

    /// The correlation id of the call
    #[serde(default)]
    pub id: CompactString,
}

impl ToolInvocation {
    /// Create a new invocation
    pub fn new(
        recipient: impl Into<CompactString>,
        arguments: impl Into<String>,
        id: impl Into<CompactString>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            arguments: arguments.into(),
            id: id.into(),
        }
    }
}

/// Provider of tool definitions
///
/// Queried by the prompt assembler to validate and render the tool
/// section of a request.
pub trait ToolCatalog {
    /// Definitions for the requested ids, unknown ids are skipped
    fn definitions_for(&self, ids: &[CompactString]) -> Vec<ToolCatalogEntry>;

    /// Every definition in the catalog
    fn all_definitions(&self) -> Vec<ToolCatalogEntry>;

    /// The names the catalog provides
    fn names(&self) -> BTreeSet<CompactString> {
        self.all_definitions()
            .into_iter()
            .map(|entry| entry.name)
            .collect()
    }
}

/// An immutable in-memory tool catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tools: BTreeMap<CompactString, ToolCatalogEntry>,
}

impl StaticCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to the catalog
    pub fn with(mut self, entry: ToolCatalogEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Insert an entry, replacing any entry with the same name
    pub fn insert(&mut self, entry: ToolCatalogEntry) {
        self.tools.insert(entry.name.clone(), entry);
    }

    /// Look up an entry by name
    pub fn get(&self, name: &str) -> Option<&ToolCatalogEntry> {
        self.tools.get(name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolCatalog for StaticCatalog {
    fn definitions_for(&self, ids: &[CompactString]) -> Vec<ToolCatalogEntry> {
        ids.iter()
            .filter_map(|id| self.tools.get(id.as_str()).cloned())
            .collect()
    }

    fn all_definitions(&self) -> Vec<ToolCatalogEntry> {
        self.tools.values().cloned().collect()
    }

    fn names(&self) -> BTreeSet<CompactString> {
        self.tools.keys().cloned().collect()
    }
}

impl FromIterator<ToolCatalogEntry> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = ToolCatalogEntry>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

impl<T: ToolCatalog + ?Sized> ToolCatalog for &T {
    fn definitions_for(&self, ids: &[CompactString]) -> Vec<ToolCatalogEntry> {
        (**self).definitions_for(ids)
    }

    fn all_definitions(&self) -> Vec<ToolCatalogEntry> {
        (**self).all_definitions()
    }

    fn names(&self) -> BTreeSet<CompactString> {
        (**self).names()
    }
}

//! Errors raised while encoding a request

use crate::ModelFamily;
use compact_str::CompactString;
use std::collections::BTreeSet;

/// Protocol layer errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Some requested tools are not provided by the catalog
    #[error("tools not available: {}", join(.missing))]
    ToolsNotAvailable {
        /// The tool ids the caller asked for
        requested: BTreeSet<CompactString>,
        /// The requested ids the catalog does not provide
        missing: BTreeSet<CompactString>,
    },

    /// The family has no chat-turn rendering
    #[error("model family {0} has no prompt rendering")]
    UnsupportedFamily(ModelFamily),
}

/// Result alias for the protocol layer
pub type Result<T> = std::result::Result<T, Error>;

fn join(names: &BTreeSet<CompactString>) -> String {
    names
        .iter()
        .map(CompactString::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

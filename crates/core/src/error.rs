//! Identifier parse errors.

use thiserror::Error;

/// A string could not be parsed into a typed identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: String,
}

impl InvalidId {
    pub fn new(kind: &'static str, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// Name of the identifier type that failed to parse (e.g. "AggregateId").
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

//! Error types for markup scanning.
//!
//! Only the scanner fails. Handlers driven by the scanner react to events
//! and never produce errors of their own.

use thiserror::Error;

/// Malformed markup encountered while scanning a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// A tag was opened with `<` but the document ended before its `>`.
    #[error("Unterminated tag <{name}> starting at line {line}, column {col}")]
    UnterminatedTag {
        name: String,
        line: usize,
        col: usize,
    },

    /// A quoted attribute value was never closed.
    #[error("Unterminated value for attribute '{attribute}' at line {line}, column {col}")]
    UnterminatedAttributeValue {
        attribute: String,
        line: usize,
        col: usize,
    },

    /// A comment or CDATA section was never closed.
    #[error("Unterminated {kind} starting at line {line}, column {col}")]
    UnterminatedSection {
        kind: &'static str,
        line: usize,
        col: usize,
    },
}

impl MarkupError {
    /// Line (1-based) where the malformed construct starts.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::UnterminatedTag { line, .. }
            | Self::UnterminatedAttributeValue { line, .. }
            | Self::UnterminatedSection { line, .. } => *line,
        }
    }
}

/// Result type alias for markup operations.
pub type Result<T> = std::result::Result<T, MarkupError>;

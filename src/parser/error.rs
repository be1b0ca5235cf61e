//! Parse errors

use thiserror::Error;

/// Errors that abort parsing of a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `=begin` block with no matching `=end`
    #[error("unterminated `=begin {block}` block")]
    Unterminated { block: String, line: usize },

    /// A directive line that cannot be interpreted
    #[error("{message}")]
    Malformed { line: usize, message: String },
}

impl ParseError {
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        ParseError::Malformed {
            line,
            message: message.into(),
        }
    }

    /// Line where the error was detected
    pub fn line(&self) -> usize {
        match self {
            ParseError::Unterminated { line, .. } | ParseError::Malformed { line, .. } => *line,
        }
    }
}

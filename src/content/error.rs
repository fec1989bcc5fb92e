//! Parse errors and non-fatal diagnostics

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A fatal problem with a single post
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostError {
    /// A mandatory front-matter field is absent, null, or blank
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("line {line}: malformed date `{value}`")]
    MalformedDate { value: String, line: usize },

    /// A code fence opened at `line` is never closed
    #[error("line {line}: code fence `{fence}` is never closed")]
    UnbalancedFence { line: usize, fence: String },

    #[error("front-matter opened on line 1 is never closed")]
    UnterminatedFrontMatter,

    #[error("{}invalid front-matter: {message}", line_prefix(.line))]
    InvalidFrontMatter {
        message: String,
        line: Option<usize>,
    },

    /// Raised only when unknown keys are configured to be rejected
    #[error("{}unknown front-matter key `{key}`", line_prefix(.line))]
    UnknownField { key: String, line: Option<usize> },
}

impl PostError {
    /// Source line the error points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            PostError::MalformedDate { line, .. } | PostError::UnbalancedFence { line, .. } => {
                Some(*line)
            }
            PostError::UnterminatedFrontMatter => Some(1),
            PostError::InvalidFrontMatter { line, .. } | PostError::UnknownField { line, .. } => {
                *line
            }
            PostError::MissingField { .. } => None,
        }
    }

    /// Stable machine-readable name
    pub fn kind(&self) -> &'static str {
        match self {
            PostError::MissingField { .. } => "missing_field",
            PostError::MalformedDate { .. } => "malformed_date",
            PostError::UnbalancedFence { .. } => "unbalanced_fence",
            PostError::UnterminatedFrontMatter => "unterminated_front_matter",
            PostError::InvalidFrontMatter { .. } => "invalid_front_matter",
            PostError::UnknownField { .. } => "unknown_field",
        }
    }
}

fn line_prefix(line: &Option<usize>) -> String {
    line.map(|l| format!("line {}: ", l)).unwrap_or_default()
}

/// A non-fatal finding returned next to a successfully parsed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// `[label][reference]` with no `[reference]: url` definition
    DanglingReference { reference: String, line: usize },
    MissingLayout,
    DuplicateTag { tag: String },
}

impl Diagnostic {
    pub fn line(&self) -> Option<usize> {
        match self {
            Diagnostic::DanglingReference { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DanglingReference { reference, line } => {
                write!(f, "line {}: link reference `{}` has no definition", line, reference)
            }
            Diagnostic::MissingLayout => f.write_str("no `layout` given"),
            Diagnostic::DuplicateTag { tag } => write!(f, "tag `{}` is listed more than once", tag),
        }
    }
}

/// Failure to produce a record from a file on disk
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Post(#[from] PostError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = PostError::MissingField { field: "title" };
        assert_eq!(err.to_string(), "missing required field `title`");

        let err = PostError::UnbalancedFence {
            line: 12,
            fence: "```".to_string(),
        };
        assert_eq!(err.line(), Some(12));
        assert!(err.to_string().contains("line 12"));

        let err = PostError::InvalidFrontMatter {
            message: "bad".to_string(),
            line: None,
        };
        assert_eq!(err.to_string(), "invalid front-matter: bad");
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::DanglingReference {
            reference: "bar".to_string(),
            line: 7,
        };
        assert_eq!(d.line(), Some(7));
        assert_eq!(d.to_string(), "line 7: link reference `bar` has no definition");
        assert_eq!(Diagnostic::MissingLayout.line(), None);
    }
}

//! Error types for the analysis engine

use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the in-memory symbol store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("symbol store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("unexpected {column} value in symbol store: {value}")]
    InvalidValue { column: &'static str, value: String },
}

/// Syntax error reported by the parser front-end
#[derive(Debug, Clone, Error)]
#[error("syntax error in {file} at line {line}: {message}")]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub message: String,
}

/// Fatal error while building the graph for one file
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("undefined local variable `{name}` at line {line}")]
    UndefinedLocalVariable { name: String, line: usize },

    #[error("uninitialized constant {name} at line {line}")]
    UndefinedConstant { name: String, line: usize },

    #[error("receiver `{fqname}` is not registered")]
    MissingReceiver { fqname: String },

    #[error("no call hook matches `{name}` in {scope}")]
    NoMatchingHook { scope: String, name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type BuildResult<T> = Result<T, BuildError>;

impl BuildError {
    /// Source line the error points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            BuildError::UndefinedLocalVariable { line, .. }
            | BuildError::UndefinedConstant { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Error surfaced by the update coordinator
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to analyze {}: {source}", path.display())]
    Build {
        path: PathBuf,
        #[source]
        source: BuildError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_messages() {
        let err = BuildError::UndefinedLocalVariable {
            name: "x".to_string(),
            line: 3,
        };
        assert_eq!(err.to_string(), "undefined local variable `x` at line 3");
        assert_eq!(err.line(), Some(3));

        let err = BuildError::MissingReceiver {
            fqname: "Foo".to_string(),
        };
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_parse_error_message() {
        let err = ParseError {
            file: "a.rb".to_string(),
            line: 2,
            message: "unexpected end".to_string(),
        };
        assert_eq!(err.to_string(), "syntax error in a.rb at line 2: unexpected end");
    }
}

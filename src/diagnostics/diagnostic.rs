use crate::error::{BuildError, ParseError};
use std::path::{Path, PathBuf};

/// Diagnostic severity level (LSP compatible)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

impl DiagnosticLevel {
    pub fn as_str(&self) -> &str {
        match self {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
        }
    }
}

/// Source code location, 1-based line and column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub length: Option<usize>, // Character length of the error span
}

impl Location {
    /// Start of `line`, or of the file when the line is unknown
    pub fn line_start(file: &Path, line: Option<usize>) -> Self {
        Self {
            file: file.to_path_buf(),
            line: line.unwrap_or(1).max(1),
            column: 1,
            length: None,
        }
    }
}

/// Analysis diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Location,
    pub level: DiagnosticLevel,
    pub message: String,
    pub code: Option<String>, // e.g., "E001"
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(location: Location, message: String) -> Self {
        Self {
            location,
            level: DiagnosticLevel::Error,
            message,
            code: None,
        }
    }

    /// Create a warning diagnostic
    pub fn warning(location: Location, message: String) -> Self {
        Self {
            location,
            level: DiagnosticLevel::Warning,
            message,
            code: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    /// The file could not be parsed
    pub fn syntax_error(file: &Path, err: &ParseError) -> Self {
        Self::error(Location::line_start(file, Some(err.line)), err.message.clone())
            .with_code("E001")
    }

    /// The graph for the file could not be built
    pub fn build_failure(file: &Path, err: &BuildError) -> Self {
        let code = match err {
            BuildError::UndefinedLocalVariable { .. } => "E002",
            BuildError::UndefinedConstant { .. } => "E003",
            BuildError::MissingReceiver { .. }
            | BuildError::NoMatchingHook { .. }
            | BuildError::Store(_) => "E100",
        };
        Self::error(Location::line_start(file, err.line()), err.to_string()).with_code(code)
    }

    /// A file the workspace walk could not read
    pub fn unreadable(file: &Path, message: String) -> Self {
        Self::warning(Location::line_start(file, None), message).with_code("W001")
    }
}

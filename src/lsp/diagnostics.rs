use crate::diagnostics::{Diagnostic as HiFriendDiagnostic, DiagnosticLevel};
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range};

/// Length of the first backticked name in a message, such as "`foo`"
fn backticked_name_length(message: &str) -> Option<u32> {
    let start = message.find('`')?;
    let end = message[start + 1..].find('`')?;
    Some(message[start + 1..start + 1 + end].len() as u32)
}

/// Convert a HiFriend diagnostic to an LSP diagnostic
pub fn to_lsp_diagnostic(diag: &HiFriendDiagnostic) -> Diagnostic {
    let severity = match diag.level {
        DiagnosticLevel::Error => DiagnosticSeverity::ERROR,
        DiagnosticLevel::Warning => DiagnosticSeverity::WARNING,
    };

    let start_line = diag.location.line.saturating_sub(1) as u32;
    let start_char = diag.location.column.saturating_sub(1) as u32;

    let highlight_length = diag
        .location
        .length
        .map(|len| len as u32)
        .or_else(|| backticked_name_length(&diag.message))
        .unwrap_or(5);

    Diagnostic {
        range: Range {
            start: Position {
                line: start_line,
                character: start_char,
            },
            end: Position {
                line: start_line,
                character: start_char + highlight_length,
            },
        },
        severity: Some(severity),
        code: diag.code.clone().map(NumberOrString::String),
        code_description: None,
        source: Some("hifriend".to_string()),
        message: diag.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Location;
    use std::path::PathBuf;

    #[test]
    fn test_to_lsp_diagnostic() {
        let diag = HiFriendDiagnostic {
            level: DiagnosticLevel::Error,
            location: Location {
                file: PathBuf::from("test.rb"),
                line: 5,
                column: 10,
                length: Some(6),
            },
            message: "uninitialized constant Config at line 5".to_string(),
            code: Some("E003".to_string()),
        };

        let lsp_diag = to_lsp_diagnostic(&diag);

        assert_eq!(lsp_diag.range.start.line, 4);
        assert_eq!(lsp_diag.range.start.character, 9);
        assert_eq!(lsp_diag.range.end.character, 15);
        assert_eq!(lsp_diag.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(lsp_diag.code, Some(NumberOrString::String("E003".to_string())));
        assert_eq!(lsp_diag.source.as_deref(), Some("hifriend"));
    }

    #[test]
    fn test_highlight_falls_back_to_backticked_name() {
        let diag = HiFriendDiagnostic::error(
            Location::line_start(&PathBuf::from("test.rb"), Some(2)),
            "undefined local variable `counter` at line 2".to_string(),
        );

        let lsp_diag = to_lsp_diagnostic(&diag);

        assert_eq!(lsp_diag.range.start.line, 1);
        assert_eq!(lsp_diag.range.start.character, 0);
        assert_eq!(lsp_diag.range.end.character, 7);
    }

    #[test]
    fn test_backticked_name_length() {
        assert_eq!(backticked_name_length("undefined local variable `name`"), Some(4));
        assert_eq!(backticked_name_length("no name here"), None);
    }
}

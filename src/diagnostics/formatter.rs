use super::diagnostic::Diagnostic;
use std::fs;
use std::path::Path;

fn headline(diag: &Diagnostic) -> String {
    format!(
        "{}:{}:{}: {}: {}",
        diag.location.file.display(),
        diag.location.line,
        diag.location.column,
        diag.level.as_str(),
        diag.message
    )
}

/// Format diagnostics in LSP-compatible format
///
/// Example output:
/// ```text
/// app/models/user.rb:10:1: error: uninitialized constant Missing at line 10
/// ```
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(headline)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format diagnostics with code snippet
///
/// Example output:
/// ```text
/// app/models/user.rb:10:1: error: uninitialized constant Missing at line 10
///    Missing.new
///    ^
/// ```
pub fn format_diagnostics_with_source(diagnostics: &[Diagnostic], source_code: &str) -> String {
    let lines: Vec<&str> = source_code.lines().collect();

    diagnostics
        .iter()
        .map(|diag| {
            let mut output = headline(diag);

            if diag.location.line > 0 && diag.location.line <= lines.len() {
                let source_line = lines[diag.location.line - 1];

                output.push('\n');
                output.push_str("   ");
                output.push_str(source_line);
                output.push('\n');

                let column = diag.location.column.saturating_sub(1);
                output.push_str("   ");
                output.push_str(&" ".repeat(column));
                output.push('^');
            }

            output
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Read source file and format diagnostics with code snippet
pub fn format_diagnostics_with_file(diagnostics: &[Diagnostic], file_path: &Path) -> String {
    match fs::read_to_string(file_path) {
        Ok(source) => format_diagnostics_with_source(diagnostics, &source),
        Err(_) => format_diagnostics(diagnostics),
    }
}

/// Format diagnostics with their codes appended
pub fn format_diagnostics_detailed(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|diag| {
            let mut output = headline(diag);
            if let Some(code) = &diag.code {
                output.push_str(&format!(" [{}]", code));
            }
            output
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::diagnostic::Location;
    use std::path::PathBuf;

    fn sample() -> Diagnostic {
        Diagnostic::error(
            Location {
                file: PathBuf::from("test.rb"),
                line: 2,
                column: 3,
                length: None,
            },
            "uninitialized constant Foo at line 2".to_string(),
        )
        .with_code("E003")
    }

    #[test]
    fn test_format_diagnostics() {
        assert_eq!(
            format_diagnostics(&[sample()]),
            "test.rb:2:3: error: uninitialized constant Foo at line 2"
        );
    }

    #[test]
    fn test_format_with_source() {
        let output = format_diagnostics_with_source(&[sample()], "x = 1\n  Foo\n");
        assert_eq!(
            output,
            "test.rb:2:3: error: uninitialized constant Foo at line 2\n     Foo\n     ^"
        );
    }

    #[test]
    fn test_format_detailed() {
        assert!(format_diagnostics_detailed(&[sample()]).ends_with(" [E003]"));
    }
}

pub mod diagnostic;
pub mod formatter;

pub use diagnostic::{Diagnostic, DiagnosticLevel, Location};
pub use formatter::{format_diagnostics, format_diagnostics_detailed, format_diagnostics_with_file};

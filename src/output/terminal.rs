//! Terminal output utilities.
//!
//! The coloured validation report.

use crate::error::ErrorKind;
use crate::processing::{ReportEntry, ValidationReport};
use colored::{ColoredString, Colorize};

/// One report line, kind highlighted.
pub fn format_report_entry(entry: &ReportEntry) -> String {
    format!(
        "[{component}] {kind} {message}",
        component = entry.component,
        kind = highlight(entry.kind),
        message = entry.message
    )
}

fn highlight(kind: ErrorKind) -> ColoredString {
    let text = kind.to_string();
    match kind {
        ErrorKind::OverlapDetected => text.on_red(),
        ErrorKind::CapacityExceeded => text.red(),
        ErrorKind::InvalidRule | ErrorKind::InvalidPlacement => text.yellow(),
        _ => text.magenta(),
    }
}

/// Print the validation report to stderr.
pub fn print_report(report: &ValidationReport) {
    if report.is_empty() {
        eprintln!("#{}# no planning issues", "OK".on_green());
        return;
    }
    eprintln!(
        "#{}# {} planning issue(s), not provisionable:",
        "NOTE".on_red(),
        report.len()
    );
    for entry in report {
        eprintln!("  {}", format_report_entry(entry));
    }
}

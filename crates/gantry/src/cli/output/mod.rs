//! Output formatting utilities

use console::{style, Style};

use gantry_core::types::{CompatibilityIssue, CompatibilityWarning, VersionConflict};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for version numbers
pub fn version_style() -> Style {
    Style::new().green().bold()
}

/// Style for package names
pub fn package_style() -> Style {
    Style::new().cyan()
}

/// Print a JSON value
pub fn json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print conflicts as an indented list
pub fn conflicts(conflicts: &[VersionConflict]) {
    for conflict in conflicts {
        println!(
            "  {} [{}] {}",
            style("✗").red(),
            style(conflict.conflict_type).yellow(),
            conflict.description
        );
        if let Some(resolution) = &conflict.suggested_resolution {
            println!("      {}", style(resolution).dim());
        }
    }
}

/// Print compatibility issues and warnings
pub fn compatibility(issues: &[CompatibilityIssue], warnings: &[CompatibilityWarning]) {
    for issue in issues {
        println!("  {} {}", style("✗").red(), issue.description);
        println!("      {}", style(&issue.suggested_fix).dim());
    }
    for warn in warnings {
        println!("  {} {}", style("!").yellow(), warn.message);
        println!("      {}", style(&warn.recommendation).dim());
    }
}

/// Render a list of names, comma separated
pub fn names(names: &[String]) -> String {
    if names.is_empty() {
        return style("(none)").dim().to_string();
    }
    names
        .iter()
        .map(|n| package_style().apply_to(n).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

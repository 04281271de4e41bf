//! Compact output rendering helpers for CLI surfaces.
//!
//! Keeps tables bounded and readable in a terminal.

use crate::core::scoring::{SpeciesHealth, TankCondition};
use colored::{ColoredString, Colorize};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Widest a single table cell may render before it is truncated.
pub const MAX_CELL_CHARS: usize = 32;

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Render rows as a left-aligned, space-padded table with a header rule.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| compact_line(c, MAX_CELL_CHARS)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&pad_row(headers.iter().map(|h| h.to_string()), &widths));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in cells {
        out.push('\n');
        out.push_str(&pad_row(row.into_iter(), &widths));
    }
    out
}

fn pad_row(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| {
            let len = cell.chars().count();
            format!("{}{}", cell, " ".repeat(width.saturating_sub(len)))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn tank_label(label: TankCondition) -> ColoredString {
    match label {
        TankCondition::Excellent => label.as_str().green().bold(),
        TankCondition::Good => label.as_str().green(),
        TankCondition::Satisfactory => label.as_str().yellow(),
        TankCondition::Critical => label.as_str().red().bold(),
        TankCondition::Undetermined => label.as_str().dimmed(),
    }
}

pub fn species_label(label: SpeciesHealth) -> ColoredString {
    match label {
        SpeciesHealth::Excellent => label.as_str().green().bold(),
        SpeciesHealth::Good => label.as_str().green(),
        SpeciesHealth::Satisfactory => label.as_str().yellow(),
        SpeciesHealth::Poor => label.as_str().red(),
        SpeciesHealth::Critical => label.as_str().red().bold(),
        SpeciesHealth::NoData => label.as_str().dimmed(),
    }
}

/// Two-decimal rendering used for weights, sizes and volumes.
pub fn fixed2(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| format!("{:.2}", v))
}

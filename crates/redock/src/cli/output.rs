//! Output formatting utilities for CLI commands

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use serde_json::Value;

/// Longest value preview shown in tables.
const PREVIEW_LEN: usize = 60;

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{}", table);
}

/// One-line preview of an arbitrary JSON value
///
/// Examples:
/// - "web:latest" -> web:latest
/// - {"image": "web"} -> {"image":"web"}
pub fn preview_value(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > PREVIEW_LEN {
        let cut: String = text.chars().take(PREVIEW_LEN - 3).collect();
        format!("{}...", cut)
    } else {
        text
    }
}

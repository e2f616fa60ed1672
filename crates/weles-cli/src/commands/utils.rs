//! Shared output helpers for CLI commands.

use colored::*;
use serde_json::Value;
use weles_sdk::Table;

/// Print a table with a bold header, or a dimmed note when it has no rows.
pub fn print_table(title: &str, table: &Table) {
    println!("{}", title.cyan().bold());
    if table.is_empty() {
        println!("  {}", "(no rows)".bright_black());
    } else {
        println!("{}", table);
    }
}

/// Print the fields of a JSON object as aligned `key: value` lines.
pub fn print_fields(map: &serde_json::Map<String, Value>) {
    let width = map.keys().map(String::len).max().unwrap_or(0);
    for (key, value) in map {
        println!("  {:width$}  {}", format!("{}:", key), format_value(value), width = width + 1);
    }
}

/// Render a JSON value without quoting plain strings.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

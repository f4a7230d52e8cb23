//! Terminal output: rounded tables for lists, aligned key/value blocks
//! for single items.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

/// Build a rounded table from rows.
pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Left-aligned `Label: value` lines, padded to the longest label.
pub fn render_detail(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;
    pairs
        .iter()
        .map(|(label, value)| format!("{:<width$} {value}", format!("{label}:")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print to stdout, skipping empty output.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: &'static str,
    }

    #[test]
    fn detail_aligns_values() {
        let out = render_detail(&[("Host", "10.0.0.1".into()), ("gNMI", "0.7.0".into())]);
        assert_eq!(out, "Host: 10.0.0.1\ngNMI: 0.7.0");

        let out = render_detail(&[("ID", "leaf1".into()), ("Version", "0.7.0".into())]);
        assert_eq!(out, "ID:      leaf1\nVersion: 0.7.0");
    }

    #[test]
    fn table_has_headers() {
        let out = render_table(&[Row { id: "leaf1" }]);
        assert!(out.contains("ID"));
        assert!(out.contains("leaf1"));
    }
}

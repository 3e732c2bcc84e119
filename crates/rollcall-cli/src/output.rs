//! Output formatting utilities.

use rollcall_core::{CheckStatus, VerificationDetails};
use serde::Serialize;

/// Pretty JSON, or `{}` if the value cannot be serialized.
pub fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Prints a fixed-width header row and a rule under it.
pub fn print_table_header(columns: &[(&str, usize)]) {
    let line = columns
        .iter()
        .map(|&(name, width)| format!("{:<width$}", name, width = width))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", line.trim_end());
    let total = columns.iter().map(|(_, w)| w + 1).sum::<usize>();
    println!("{}", "-".repeat(total.saturating_sub(1)));
}

/// Formats one row to the header's widths, truncating long cells.
pub fn format_table_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", truncate(cell, width), width = width))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

/// One CSV record (RFC 4180 quoting), without the line ending.
pub fn csv_record<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|cell| csv_field(cell.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Stage-by-stage check-in result, one line per stage.
pub fn format_checks(details: &VerificationDetails) -> String {
    let mut lines = Vec::with_capacity(details.checks.len());
    for result in &details.checks {
        let status = match result.status {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "skipped",
        };
        let check = serde_json::to_value(result.check)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        match &result.code {
            Some(code) => lines.push(format!("  {:<12} {:<8} {}", check, status, code)),
            None => lines.push(format!("  {:<12} {}", check, status)),
        }
    }
    if let Some(distance) = details.distance_meters {
        lines.push(format!("  distance     {:.1} m", distance));
    }
    lines.join("\n")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_quotes_only_when_needed() {
        assert_eq!(
            csv_record(&["plain", "with,comma", "say \"hi\""]),
            "plain,\"with,comma\",\"say \"\"hi\"\"\""
        );
    }

    #[test]
    fn rows_truncate_to_width() {
        let row = format_table_row(&["abcdefghij", "x"], &[6, 3]);
        assert_eq!(row, "abc... x");
    }
}

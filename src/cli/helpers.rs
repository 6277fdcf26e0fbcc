//! Shared helper functions for CLI commands

use tabled::{builder::Builder, settings::Style};

use crate::cli::args::OutputFormat;

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Format tabular rows as TSV, CSV, or a markdown table
///
/// `Auto` and every other non-tabular format fall back to TSV.
pub fn format_rows(headers: &[&str], rows: &[Vec<String>], format: OutputFormat) -> String {
    match format {
        OutputFormat::Csv => {
            let mut out = headers.join(",");
            out.push('\n');
            for row in rows {
                let cells: Vec<String> = row.iter().map(|c| escape_csv(c)).collect();
                out.push_str(&cells.join(","));
                out.push('\n');
            }
            out
        }
        OutputFormat::Md => {
            let mut builder = Builder::default();
            builder.push_record(headers.iter().copied());
            for row in rows {
                builder.push_record(row.iter().map(String::as_str));
            }
            let mut table = builder.build();
            table.with(Style::markdown());
            let mut out = table.to_string();
            out.push('\n');
            out
        }
        _ => {
            let mut out = headers.join("\t");
            out.push('\n');
            for row in rows {
                let cells: Vec<String> = row.iter().map(|c| c.replace(['\t', '\n'], " ")).collect();
                out.push_str(&cells.join("\t"));
                out.push('\n');
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Jalón de versión", 8), "Jalón...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    fn rows() -> Vec<Vec<String>> {
        vec![vec!["acme/web%5".to_string(), "Beta, final".to_string()]]
    }

    #[test]
    fn test_format_rows_tsv() {
        let out = format_rows(&["REF", "TITLE"], &rows(), OutputFormat::Tsv);
        assert_eq!(out, "REF\tTITLE\nacme/web%5\tBeta, final\n");
    }

    #[test]
    fn test_format_rows_csv() {
        let out = format_rows(&["REF", "TITLE"], &rows(), OutputFormat::Csv);
        assert_eq!(out, "REF,TITLE\nacme/web%5,\"Beta, final\"\n");
    }

    #[test]
    fn test_format_rows_markdown() {
        let out = format_rows(&["REF", "TITLE"], &rows(), OutputFormat::Md);
        assert!(out.starts_with("| REF"));
        assert!(out.contains("| acme/web%5 | Beta, final |"));
    }

    #[test]
    fn test_format_rows_auto_is_tsv() {
        let auto = format_rows(&["REF", "TITLE"], &rows(), OutputFormat::Auto);
        assert_eq!(auto, format_rows(&["REF", "TITLE"], &rows(), OutputFormat::Tsv));
    }
}

//! `refmark refs` command - list the milestones a document references

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::cli::helpers::{format_rows, truncate_str};
use crate::cli::session::{read_input, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::MilestoneId;
use crate::core::{Project, ReferenceFilter, ReferenceToken};
use crate::entities::Milestone;

#[derive(clap::Args, Debug)]
pub struct RefsArgs {
    /// Document to scan (stdin if omitted or '-')
    pub file: Option<PathBuf>,
}

/// One referenced milestone
#[derive(Debug, Serialize)]
struct RefRow {
    reference: String,
    project: String,
    iid: u32,
    title: String,
    state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
}

pub fn run(args: RefsArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let text = read_input(args.file.as_deref())?;

    // Output text is discarded; the renderer only notes each milestone's project.
    let mut handles: HashMap<MilestoneId, String> = HashMap::new();
    let mut renderer = |token: &ReferenceToken<'_>, milestone: &Milestone, project: &Project| -> String {
        handles
            .entry(milestone.id)
            .or_insert_with(|| project.handle.to_string());
        token.raw().to_string()
    };

    let filter = ReferenceFilter::for_milestones(&session.store, &session.store);
    let rendered = filter
        .render_document(&text, &session.current, &mut renderer)
        .into_diagnostic()?;

    let rows: Vec<RefRow> = rendered
        .references
        .iter()
        .map(|m| {
            let project = handles.get(&m.id).cloned().unwrap_or_default();
            RefRow {
                reference: format!("{}%{}", project, m.iid),
                project,
                iid: m.iid.get(),
                title: m.title.clone(),
                state: m.state.to_string(),
                due_date: m.due_date.map(|d| d.to_string()),
            }
        })
        .collect();

    print!("{}", format_refs(&rows, global.format)?);
    Ok(())
}

fn format_refs(rows: &[RefRow], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(rows).into_diagnostic()?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Yaml => serde_yml::to_string(rows).into_diagnostic(),
        OutputFormat::Id => Ok(rows.iter().map(|r| format!("{}\n", r.reference)).collect()),
        other => {
            let table: Vec<Vec<String>> = rows
                .iter()
                .map(|r| {
                    vec![
                        r.reference.clone(),
                        truncate_str(&r.title, 48),
                        r.state.clone(),
                        r.due_date.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            Ok(format_rows(&["REF", "TITLE", "STATE", "DUE"], &table, other))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<RefRow> {
        vec![
            RefRow {
                reference: "acme/web%5".to_string(),
                project: "acme/web".to_string(),
                iid: 5,
                title: "Beta".to_string(),
                state: "active".to_string(),
                due_date: Some("2024-07-01".to_string()),
            },
            RefRow {
                reference: "acme/api%1".to_string(),
                project: "acme/api".to_string(),
                iid: 1,
                title: "Launch".to_string(),
                state: "closed".to_string(),
                due_date: None,
            },
        ]
    }

    #[test]
    fn test_auto_is_tsv() {
        let out = format_refs(&rows(), OutputFormat::Auto).unwrap();
        assert_eq!(
            out,
            "REF\tTITLE\tSTATE\tDUE\nacme/web%5\tBeta\tactive\t2024-07-01\nacme/api%1\tLaunch\tclosed\t\n"
        );
    }

    #[test]
    fn test_id_format() {
        let out = format_refs(&rows(), OutputFormat::Id).unwrap();
        assert_eq!(out, "acme/web%5\nacme/api%1\n");
    }

    #[test]
    fn test_json_format() {
        let out = format_refs(&rows(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["iid"], 5);
        assert_eq!(parsed[1]["project"], "acme/api");
        assert!(parsed[1].get("due_date").is_none());
    }
}

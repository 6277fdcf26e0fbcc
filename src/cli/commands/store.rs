//! `refmark store` command - manage the SQLite milestone store
//!
//! The store holds projects (numeric id, `namespace/project` handle) and
//! their milestones, keyed per project by iid. Fill it from a YAML fixture
//! or a CSV export with `refmark store import`.

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use csv::{ReaderBuilder, StringRecord};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{format_rows, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{Iid, ProjectHandle};
use crate::core::store::{MemoryStore, ProjectStore, SqliteStore};
use crate::core::{Config, Project};
use crate::entities::MilestoneState;

#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Create an empty store (or check an existing one)
    Init,

    /// Register a project
    AddProject {
        /// Project handle (namespace/project)
        handle: ProjectHandle,

        /// Display name (defaults to the last path segment)
        #[arg(long)]
        name: Option<String>,
    },

    /// Add or update a milestone
    AddMilestone {
        /// Project handle (namespace/project)
        project: String,

        /// Project-local milestone number
        iid: Iid,

        /// Milestone title
        title: String,

        /// Milestone state
        #[arg(long, default_value = "active")]
        state: MilestoneState,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },

    /// Import projects and milestones from a YAML fixture or CSV file
    ///
    /// CSV columns: project,iid,title,state,due_date
    Import {
        /// File to import (.yaml/.yml or .csv)
        file: PathBuf,

        /// Register projects named in the CSV that the store lacks
        #[arg(long)]
        create_projects: bool,

        /// Skip rows with errors instead of aborting
        #[arg(long)]
        skip_errors: bool,
    },

    /// List projects, or the milestones of one project
    List {
        /// Show milestones of this project
        #[arg(long)]
        project: Option<String>,
    },
}

pub fn run(cmd: StoreCommands, global: &GlobalOpts) -> Result<()> {
    let path = store_path(global)?;
    match cmd {
        StoreCommands::Init => run_init(&path, global),
        StoreCommands::AddProject { handle, name } => run_add_project(&path, handle, name.as_deref(), global),
        StoreCommands::AddMilestone {
            project,
            iid,
            title,
            state,
            due,
        } => run_add_milestone(&path, &project, iid, &title, state, due, global),
        StoreCommands::Import {
            file,
            create_projects,
            skip_errors,
        } => run_import(&path, &file, create_projects, skip_errors, global),
        StoreCommands::List { project } => run_list(&path, project.as_deref(), global.format),
    }
}

fn store_path(global: &GlobalOpts) -> Result<PathBuf> {
    let path = match &global.store {
        Some(path) => path.clone(),
        None => Config::load()?.store.ok_or_else(|| {
            miette::miette!(
                help = "Pass --store or set 'store' in .refmark/config.yaml",
                "no store configured"
            )
        })?,
    };

    if matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml")) {
        return Err(miette::miette!(
            help = "YAML fixtures are read-only; import them into a .db store",
            "not a SQLite store: {}",
            path.display()
        ));
    }
    Ok(path)
}

fn run_init(path: &Path, global: &GlobalOpts) -> Result<()> {
    let store = SqliteStore::open(path).into_diagnostic()?;
    let stats = store.statistics().into_diagnostic()?;
    if !global.quiet {
        println!("{} Store ready at {}", style("✓").green(), style(path.display()).cyan());
        println!("  Projects:   {}", stats.projects);
        println!("  Milestones: {}", stats.milestones);
    }
    Ok(())
}

fn run_add_project(path: &Path, handle: ProjectHandle, name: Option<&str>, global: &GlobalOpts) -> Result<()> {
    let store = SqliteStore::open(path).into_diagnostic()?;
    if store.find_by_handle(handle.as_str()).into_diagnostic()?.is_some() {
        return Err(miette::miette!("project '{}' already exists", handle));
    }
    let project = store.create_project(handle, name).into_diagnostic()?;
    if !global.quiet {
        println!(
            "{} Added project {} (id {})",
            style("✓").green(),
            style(&project.handle).cyan(),
            project.id
        );
    }
    Ok(())
}

fn run_add_milestone(
    path: &Path,
    handle: &str,
    iid: Iid,
    title: &str,
    state: MilestoneState,
    due: Option<NaiveDate>,
    global: &GlobalOpts,
) -> Result<()> {
    let store = SqliteStore::open(path).into_diagnostic()?;
    let project = store
        .find_by_handle(handle)
        .into_diagnostic()?
        .ok_or_else(|| miette::miette!("unknown project '{}'", handle))?;
    let milestone = store
        .put_milestone(&project, iid, title, state, due)
        .into_diagnostic()?;
    if !global.quiet {
        println!(
            "{} Saved {}%{} {}",
            style("✓").green(),
            style(&project.handle).cyan(),
            milestone.iid,
            milestone.title
        );
    }
    Ok(())
}

fn run_import(path: &Path, file: &Path, create_projects: bool, skip_errors: bool, global: &GlobalOpts) -> Result<()> {
    let mut store = SqliteStore::open(path).into_diagnostic()?;

    match file.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            let fixture = MemoryStore::load(file)?;
            let stats = store.import(&fixture).into_diagnostic()?;
            if !global.quiet {
                println!(
                    "{} Imported {} projects and {} milestones from {}",
                    style("✓").green(),
                    stats.projects,
                    stats.milestones,
                    style(file.display()).cyan()
                );
            }
        }
        Some("csv") => {
            let stats = import_csv(&store, file, create_projects, skip_errors)?;
            if !global.quiet {
                println!(
                    "{} Imported {} milestones from {}",
                    style("✓").green(),
                    stats.saved,
                    style(file.display()).cyan()
                );
                if stats.projects_created > 0 {
                    println!("  Projects created: {}", style(stats.projects_created).green());
                }
                if stats.errors > 0 {
                    println!("  Rows skipped:     {}", style(stats.errors).red());
                }
            }
        }
        _ => {
            return Err(miette::miette!(
                help = "Use a .yaml/.yml fixture or a .csv file",
                "unsupported import file: {}",
                file.display()
            ))
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct CsvImportStats {
    rows: usize,
    saved: usize,
    projects_created: usize,
    errors: usize,
}

fn import_csv(store: &SqliteStore, file: &Path, create_projects: bool, skip_errors: bool) -> Result<CsvImportStats> {
    let reader = File::open(file).map_err(|e| miette::miette!("cannot read {}: {}", file.display(), e))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(reader));

    let headers = rdr.headers().into_diagnostic()?.clone();
    let header_map = build_header_map(&headers);
    for required in ["project", "iid", "title"] {
        if !header_map.contains_key(required) {
            return Err(miette::miette!("missing required column '{}'", required));
        }
    }

    // All rows land together or not at all
    store.atomically(|store| {
        let mut stats = CsvImportStats::default();
        let mut projects: HashMap<String, Project> = HashMap::new();

        for (row_idx, result) in rdr.records().enumerate() {
            let row_num = row_idx + 2; // +2 for 1-indexed and header row
            stats.rows += 1;

            let outcome = result
                .map_err(|e| format!("CSV parse error: {}", e))
                .and_then(|record| {
                    import_row(
                        store,
                        &record,
                        &header_map,
                        &mut projects,
                        create_projects,
                        &mut stats.projects_created,
                    )
                });

            match outcome {
                Ok(()) => stats.saved += 1,
                Err(message) => {
                    eprintln!("{} Row {}: {}", style("✗").red(), row_num, message);
                    stats.errors += 1;
                    if !skip_errors {
                        return Err(miette::miette!("{} at row {}", message, row_num));
                    }
                }
            }
        }

        Ok(stats)
    })
}

fn import_row(
    store: &SqliteStore,
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    projects: &mut HashMap<String, Project>,
    create_projects: bool,
    created: &mut usize,
) -> std::result::Result<(), String> {
    let handle = get_field(record, header_map, "project").ok_or("missing required field 'project'")?;
    let iid: Iid = get_field(record, header_map, "iid")
        .ok_or("missing required field 'iid'")?
        .parse()
        .map_err(|e| format!("{}", e))?;
    let title = get_field(record, header_map, "title").ok_or("missing required field 'title'")?;
    let state: MilestoneState = match get_field(record, header_map, "state") {
        Some(s) => s.parse().map_err(|e| format!("{}", e))?,
        None => MilestoneState::default(),
    };
    let due_date = get_field(record, header_map, "due_date")
        .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").map_err(|e| format!("invalid due_date '{}': {}", d, e)))
        .transpose()?;

    let project = match projects.get(&handle) {
        Some(project) => project.clone(),
        None => {
            let project = match store.find_by_handle(&handle).map_err(|e| e.to_string())? {
                Some(project) => project,
                None if create_projects => {
                    let parsed = ProjectHandle::parse(&handle).map_err(|e| e.to_string())?;
                    *created += 1;
                    store.create_project(parsed, None).map_err(|e| e.to_string())?
                }
                None => return Err(format!("unknown project '{}'", handle)),
            };
            projects.insert(handle, project.clone());
            project
        }
    };

    store
        .put_milestone(&project, iid, &title, state, due_date)
        .map_err(|e| e.to_string())?;
    Ok(())
}

/// Build a map from header name to column index
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase().trim().to_string(), i))
        .collect()
}

fn get_field(record: &StringRecord, header_map: &HashMap<String, usize>, field: &str) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Serialize)]
struct ProjectRow<'a> {
    #[serde(flatten)]
    project: &'a Project,
    milestones: usize,
}

fn run_list(path: &Path, project: Option<&str>, format: OutputFormat) -> Result<()> {
    let store = SqliteStore::open(path).into_diagnostic()?;

    if let Some(handle) = project {
        let project = store
            .find_by_handle(handle)
            .into_diagnostic()?
            .ok_or_else(|| miette::miette!("unknown project '{}'", handle))?;
        let milestones = store.milestones(&project).into_diagnostic()?;

        let out = match format {
            OutputFormat::Json => serde_json::to_string_pretty(&milestones).into_diagnostic()? + "\n",
            OutputFormat::Yaml => serde_yml::to_string(&milestones).into_diagnostic()?,
            OutputFormat::Id => milestones
                .iter()
                .map(|m| format!("{}%{}\n", project.handle, m.iid))
                .collect(),
            other => {
                let rows: Vec<Vec<String>> = milestones
                    .iter()
                    .map(|m| {
                        vec![
                            m.iid.to_string(),
                            truncate_str(&m.title, 48),
                            m.state.to_string(),
                            m.due_date.map(|d| d.to_string()).unwrap_or_default(),
                        ]
                    })
                    .collect();
                format_rows(&["IID", "TITLE", "STATE", "DUE"], &rows, other)
            }
        };
        print!("{}", out);
        return Ok(());
    }

    let projects = store.projects().into_diagnostic()?;
    let mut listed = Vec::with_capacity(projects.len());
    for project in &projects {
        let milestones = store.milestones(project).into_diagnostic()?.len();
        listed.push(ProjectRow { project, milestones });
    }

    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&listed).into_diagnostic()? + "\n",
        OutputFormat::Yaml => serde_yml::to_string(&listed).into_diagnostic()?,
        OutputFormat::Id => projects.iter().map(|p| format!("{}\n", p.handle)).collect(),
        other => {
            let rows: Vec<Vec<String>> = listed
                .iter()
                .map(|row| {
                    vec![
                        row.project.id.to_string(),
                        row.project.handle.to_string(),
                        row.project.display_name().to_string(),
                        row.milestones.to_string(),
                    ]
                })
                .collect();
            format_rows(&["ID", "HANDLE", "NAME", "MILESTONES"], &rows, other)
        }
    };
    print!("{}", out);
    Ok(())
}

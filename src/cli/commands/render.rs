//! `refmark render` command - replace milestone references with links

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::render::{TemplateRenderer, DEFAULT_TEMPLATE};
use crate::cli::session::{read_input, Session};
use crate::cli::GlobalOpts;
use crate::core::ReferenceFilter;

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Document to filter (stdin if omitted or '-')
    pub file: Option<PathBuf>,

    /// Tera template for each resolved reference
    #[arg(long, short = 't')]
    pub template: Option<String>,

    /// Base URL prepended to milestone links
    #[arg(long)]
    pub base_url: Option<String>,

    /// Emit path-only links (no base URL)
    #[arg(long)]
    pub only_path: bool,

    /// Write the result to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: RenderArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let text = read_input(args.file.as_deref())?;

    let template = args
        .template
        .as_deref()
        .or(session.config.template.as_deref())
        .unwrap_or(DEFAULT_TEMPLATE);
    let base_url = args
        .base_url
        .as_deref()
        .unwrap_or_else(|| session.config.base_url());

    let mut renderer = TemplateRenderer::new(template, base_url, args.only_path).into_diagnostic()?;
    let filter = ReferenceFilter::for_milestones(&session.store, &session.store);
    let rendered = filter
        .render_document(&text, &session.current, &mut renderer)
        .into_diagnostic()?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered.output).into_diagnostic()?;
            if !global.quiet {
                println!(
                    "{} Wrote {} ({} of {} references linked)",
                    style("✓").green(),
                    style(path.display()).cyan(),
                    rendered.stats.substituted,
                    rendered.stats.tokens
                );
            }
        }
        None => print!("{}", rendered.output),
    }

    if global.verbose {
        let stats = rendered.stats;
        eprintln!("{}", style("Reference Summary").bold());
        eprintln!("  Tokens:              {}", stats.tokens);
        eprintln!("  Linked:              {}", style(stats.substituted).green());
        eprintln!("  Unknown projects:    {}", style(stats.unresolved_projects).yellow());
        eprintln!("  Unknown milestones:  {}", style(stats.unresolved_entities).yellow());
        eprintln!("  Malformed:           {}", style(stats.malformed).yellow());
        eprintln!("  Template failures:   {}", style(stats.unrendered).red());
        eprintln!("  Resolver calls:      {}", stats.resolver_calls);
    }

    Ok(())
}

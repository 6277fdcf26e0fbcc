use clap::Parser;
use miette::Result;
use refmark::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    // RUST_LOG wins; otherwise warnings only, or debug for this crate with -v.
    let default_filter = if global.verbose { "warn,refmark=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Render(args) => refmark::cli::commands::render::run(args, &global),
        Commands::Refs(args) => refmark::cli::commands::refs::run(args, &global),
        Commands::Store(cmd) => refmark::cli::commands::store::run(cmd, &global),
        Commands::Completions(args) => refmark::cli::commands::completions::run(args),
    }
}

//! `refmark completions` command
//!
//! Prints a completion script for bash, zsh, fish, powershell or elvish
//! covering every `refmark` subcommand and flag (`render`, `refs`,
//! `store`, `--store`, `--project`, `--format`).
//!
//! ```bash
//! source <(refmark completions bash)                 # ~/.bashrc
//! refmark completions zsh > "${fpath[1]}/_refmark"
//! refmark completions fish > ~/.config/fish/completions/refmark.fish
//! refmark completions powershell >> $PROFILE
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;
use std::io;

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell: bash, zsh, fish, powershell or elvish
    #[arg(value_enum)]
    pub shell: Shell,
}

const BIN_NAME: &str = "refmark";

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, BIN_NAME, &mut io::stdout().lock());
    Ok(())
}

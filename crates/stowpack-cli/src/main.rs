use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod dispatch;
mod render;

#[derive(Parser, Debug)]
#[command(name = "stowpack")]
#[command(about = "Checksummed package installation into a user prefix", long_about = None)]
pub struct Cli {
    /// Install root to operate on; defaults to the per-user prefix
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a package from a source directory containing stowpack.toml
    Install {
        path: PathBuf,
        #[arg(long)]
        force_rebuild: bool,
        #[arg(long)]
        no_extension_cache: bool,
        #[arg(long)]
        strict_precheck: bool,
        #[arg(long)]
        no_plugins: bool,
    },
    /// Remove an installed package and everything it generated
    Uninstall { name: String },
    /// List installed packages
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the resolved layout and installed package count
    Doctor,
    /// Emit shell completions
    Completions { shell: clap_complete::Shell },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    dispatch::run_cli(cli)
}

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "krawler", version, about = "Run krawler jobfiles")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; defaults to ~/.krawler/config.toml then ./krawler.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a job and print its aggregated result as JSON.
    Run(RunArgs),
    /// Remove the outputs of a job from its store.
    Clean(CleanArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Jobfile (JSON, or TOML with a .toml extension).
    pub jobfile: PathBuf,

    /// Overrides the jobfile's `options.workersLimit`.
    #[arg(long)]
    pub workers_limit: Option<usize>,

    #[arg(long)]
    pub pretty: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CleanArgs {
    pub jobfile: PathBuf,
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "concord",
    about = "Concord: reconcile record collections by key",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge a source array of JSON records into a target array
    Merge(MergeArgs),
    /// Show how the source lines up with the target, without merging
    Plan(PlanArgs),
}

#[derive(Args)]
pub struct MergeArgs {
    /// JSON file holding the source array
    #[arg(long)]
    pub source: PathBuf,
    /// JSON file holding the target array; starts empty when omitted
    #[arg(long)]
    pub target: Option<PathBuf>,
    /// Field identifying a record
    #[arg(long)]
    pub key: Option<String>,
    /// Repair target order to follow the source
    #[arg(long)]
    pub ordered: bool,
    /// Mark unmatched targets instead of dropping them
    #[arg(long)]
    pub soft_delete: bool,
    /// Keep unmatched targets untouched
    #[arg(long)]
    pub preserve_absent: bool,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PlanArgs {
    #[arg(long)]
    pub source: PathBuf,
    #[arg(long)]
    pub target: PathBuf,
    #[arg(long)]
    pub key: Option<String>,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

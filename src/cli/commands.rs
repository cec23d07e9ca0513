// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands around a training run's files:
//
//   init-config  — write the default TrainerConfig as JSON
//   check-config — validate a config, print what it implies
//   history      — print the epoch history saved in a checkpoint
//
// Training itself is started from Rust code through
// TrainUseCase, since it needs the caller's network and data.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default training config to a JSON file
    InitConfig(InitConfigArgs),

    /// Validate a training config and print the derived settings
    CheckConfig(CheckConfigArgs),

    /// Print the per-epoch history stored in a run directory
    History(HistoryArgs),
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the config
    #[arg(long, default_value = "config.json")]
    pub output: PathBuf,

    /// Run name stored in the config
    #[arg(long)]
    pub name: Option<String>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Config file to check
    #[arg(long)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Run directory (<save_dir>/<name>)
    #[arg(long)]
    pub run_dir: PathBuf,

    /// Checkpoint tag to read: "latest", "best" or "epoch<N>"
    #[arg(long, default_value = "latest")]
    pub tag: String,
}

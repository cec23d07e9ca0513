// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and dispatches to the lower
// layers. Only this layer prints to stdout.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{ensure, Result};
use clap::{ArgAction, Parser};
use commands::{CheckConfigArgs, Commands, HistoryArgs, InitConfigArgs};

use crate::application::config::TrainerConfig;
use crate::domain::summary::TrainingHistory;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::trainer::log_step_for;

#[derive(Parser, Debug)]
#[command(
    name = "matting-trainer",
    version,
    about = "Inspect and prepare training runs for multi-scale image matting models."
)]
pub struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::InitConfig(args)  => run_init_config(args),
            Commands::CheckConfig(args) => run_check_config(args),
            Commands::History(args)     => run_history(args),
        }
    }
}

fn run_init_config(args: InitConfigArgs) -> Result<()> {
    ensure!(
        args.force || !args.output.exists(),
        "'{}' already exists (use --force to overwrite)",
        args.output.display()
    );
    let mut cfg = TrainerConfig::default();
    if let Some(name) = args.name {
        cfg.name = name;
    }
    cfg.save(&args.output)?;
    println!("Wrote default config to {}", args.output.display());
    Ok(())
}

fn run_check_config(args: CheckConfigArgs) -> Result<()> {
    let cfg = TrainerConfig::from_file(&args.config)?;
    println!("{}", describe_config(&cfg)?);
    Ok(())
}

fn run_history(args: HistoryArgs) -> Result<()> {
    ensure!(args.run_dir.is_dir(), "'{}' is not a run directory", args.run_dir.display());
    let ckpt  = CheckpointManager::new(&args.run_dir)?;
    let tag   = if args.tag == "latest" { ckpt.latest()? } else { args.tag };
    let state = ckpt.load_state(&tag)?;
    println!("Checkpoint '{}' (epoch {})", tag, state.epoch);
    print!("{}", format_history(&state.history));
    Ok(())
}

// ─── Formatting ───────────────────────────────────────────────────────────────

/// Human-readable summary of a config and the values derived from it.
pub fn describe_config(cfg: &TrainerConfig) -> Result<String> {
    let monitor  = cfg.monitor()?;
    let schedule = match &cfg.lr_scheduler {
        Some(s) => serde_json::to_string(s)?,
        None    => "none".to_string(),
    };
    let lines = [
        format!("{:15}: {}", "name", cfg.name),
        format!("{:15}: {}/{}", "run dir", cfg.trainer.save_dir, cfg.name),
        format!("{:15}: {}", "epochs", cfg.trainer.epochs),
        format!("{:15}: {}", "batch size", cfg.data_loader.batch_size),
        format!("{:15}: {}", "log step", log_step_for(cfg.data_loader.batch_size)),
        format!("{:15}: {}", "validation", cfg.data_loader.validation_split),
        format!("{:15}: {}", "lr", cfg.optimizer.lr),
        format!("{:15}: {}", "lr schedule", schedule),
        format!("{:15}: {}", "monitor", monitor),
        format!("{:15}: {}", "early stop", cfg.trainer.early_stop),
    ];
    Ok(lines.join("\n"))
}

/// Table of every logged epoch; empty cells where validation did
/// not run.
pub fn format_history(history: &TrainingHistory) -> String {
    let with_validation = history.entries.iter().any(|e| e.log.has_validation());
    let columns = history.columns(with_validation);

    let mut out = columns.iter().map(|c| format!("{c:>12}")).collect::<Vec<_>>().join(" ");
    out.push('\n');
    for entry in &history.entries {
        let mut cells = vec![format!("{:>12}", entry.epoch)];
        for column in columns.iter().skip(1) {
            let cell = entry
                .value(column, &history.metric_names)
                .map(|v| format!("{v:>12.6}"))
                .unwrap_or_else(|| format!("{:>12}", ""));
            cells.push(cell);
        }
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

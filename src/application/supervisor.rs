// ============================================================
// Layer 2 — Supervisor
// ============================================================
// Owns the multi-epoch loop around an EpochRunner:
//
//   for epoch in start_epoch..=epochs
//     log = runner.run_epoch(epoch)
//     print every entry, append it to history and metrics.csv
//     update the monitor (best value, epochs without improvement)
//     stop if early_stop epochs passed without improvement
//     every save_period epochs: checkpoint "epoch{n}"
//     on improvement:           checkpoint "best"
//
// A checkpoint is the runner's own records (model + optimiser)
// plus a TrainingState JSON with everything the supervisor
// needs to pick up where it left off.
//
// Errors from the runner are not retried: they end the run.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use tracing::{info, warn};

use crate::application::config::{Monitor, TrainerConfig};
use crate::domain::summary::{EpochLog, LogEntry, TrainingHistory};
use crate::infra::checkpoint::{CheckpointManager, TrainingState};
use crate::infra::metrics::MetricsLogger;

// ─── Runner traits ────────────────────────────────────────────────────────────
/// Runs whole epochs and reports their merged log.
pub trait EpochRunner {
    fn run_epoch(&mut self, epoch: usize) -> Result<EpochLog>;

    /// Metric names, in the order of EpochLog::metrics.
    fn metric_names(&self) -> Vec<String>;

    fn has_validation(&self) -> bool;
}

/// Saves and restores the runner's own state under a tag.
pub trait Checkpointable: Sized {
    fn save_checkpoint(&self, ckpt: &CheckpointManager, tag: &str) -> Result<()>;

    fn load_checkpoint(self, ckpt: &CheckpointManager, tag: &str, restore_optimizer: bool) -> Result<Self>;

    /// Position of the learning-rate schedule, if there is one.
    fn schedule_position(&self) -> Option<usize>;

    fn restore_schedule(&mut self, last_epoch: usize);
}

// ─── TrainingReport ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Last epoch that ran (start_epoch - 1 if none did)
    pub last_epoch:    usize,
    /// Best monitored value, if monitoring was active
    pub best:          Option<f64>,
    pub stopped_early: bool,
    pub history:       TrainingHistory,
}

// ─── Supervisor ───────────────────────────────────────────────────────────────
pub struct Supervisor {
    config:       TrainerConfig,
    monitor:      Monitor,
    checkpoints:  CheckpointManager,
    start_epoch:  usize,
    history:      Option<TrainingHistory>,
    best:         Option<f64>,
    not_improved: usize,
}

impl Supervisor {
    /// Prepare `run_dir` and store the config there.
    pub fn new(config: TrainerConfig, run_dir: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;
        let monitor     = config.monitor()?;
        let checkpoints = CheckpointManager::new(run_dir)?;
        checkpoints.save_config(&config)?;

        Ok(Self {
            config,
            monitor,
            checkpoints,
            start_epoch: 1,
            history: None,
            best: None,
            not_improved: 0,
        })
    }

    pub fn start_epoch(&self) -> usize {
        self.start_epoch
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Restore `runner` and the supervisor from checkpoint `tag`
    /// ("latest" resolves to the newest periodic checkpoint).
    pub fn resume<R: Checkpointable>(&mut self, runner: R, tag: &str) -> Result<R> {
        let tag = if tag == "latest" { self.checkpoints.latest()? } else { tag.to_string() };
        let state = self.checkpoints.load_state(&tag)?;
        info!("Loading checkpoint: {} ...", tag);

        let restore_optimizer = state.config.optimizer == self.config.optimizer;
        if !restore_optimizer {
            warn!(
                "Optimizer parameters given in config file differ from those of checkpoint '{}'. \
                 Optimizer parameters not being resumed.",
                tag
            );
        }

        let mut runner = runner.load_checkpoint(&self.checkpoints, &tag, restore_optimizer)?;
        if let Some(position) = state.schedule_position {
            runner.restore_schedule(position);
        }

        self.start_epoch  = state.epoch + 1;
        self.best         = state.monitor_best;
        self.not_improved = state.not_improved;
        self.history      = Some(state.history);

        info!("Checkpoint loaded. Resume training from epoch {}", self.start_epoch);
        Ok(runner)
    }

    /// Run epochs until the configured count or early stop.
    pub fn train<R: EpochRunner + Checkpointable>(&mut self, runner: &mut R) -> Result<TrainingReport> {
        let names   = runner.metric_names();
        let mut history = match self.history.take() {
            Some(history) => {
                ensure!(
                    history.metric_names == names,
                    "checkpoint history has metrics {:?}, runner has {:?}",
                    history.metric_names,
                    names
                );
                history
            }
            None => TrainingHistory::new(names.clone()),
        };
        let logger = MetricsLogger::new(self.checkpoints.dir(), history.columns(runner.has_validation()))?;

        let epochs        = self.config.trainer.epochs;
        let save_period   = self.config.trainer.save_period;
        let early_stop    = self.config.trainer.early_stop;
        let mut last      = self.start_epoch.saturating_sub(1);
        let mut stopped   = false;

        for epoch in self.start_epoch..=epochs {
            let entry = LogEntry::new(epoch, runner.run_epoch(epoch)?);
            last = epoch;

            info!("    {:15}: {}", "epoch", epoch);
            for (key, value) in entry.log.entries(&names) {
                info!("    {:15}: {}", key, value);
            }
            logger.log(&entry, &names)?;
            history.push(entry);

            let improved = self.update_monitor(history.last(), &names);

            if early_stop > 0 && self.not_improved > early_stop {
                info!("Validation performance didn't improve for {} epochs. Training stops.", early_stop);
                stopped = true;
                break;
            }

            if epoch % save_period == 0 {
                let tag = format!("epoch{epoch}");
                self.save(runner, &tag, epoch, &history)?;
                self.checkpoints.set_latest(&tag)?;
            }
            if improved {
                self.save(runner, "best", epoch, &history)?;
                info!("Saving current best: model_best ...");
            }
        }

        Ok(TrainingReport { last_epoch: last, best: self.best, stopped_early: stopped, history })
    }

    /// Returns true when the monitored value improved this epoch.
    /// A key missing from the log turns monitoring off.
    fn update_monitor(&mut self, entry: Option<&LogEntry>, names: &[String]) -> bool {
        let (Some(entry), Some(key)) = (entry, self.monitor.key().map(str::to_string)) else {
            return false;
        };

        let Some(value) = entry.value(&key, names) else {
            warn!(
                "Warning: Metric '{}' is not found. Model performance monitoring is disabled.",
                key
            );
            self.monitor = Monitor::Off;
            return false;
        };

        if self.monitor.improved(value, self.best) {
            self.best         = Some(value);
            self.not_improved = 0;
            true
        } else {
            self.not_improved += 1;
            false
        }
    }

    fn save<R: Checkpointable>(
        &self,
        runner:  &R,
        tag:     &str,
        epoch:   usize,
        history: &TrainingHistory,
    ) -> Result<()> {
        runner.save_checkpoint(&self.checkpoints, tag)?;
        let state = TrainingState {
            epoch,
            monitor_best: self.best,
            not_improved: self.not_improved,
            history: history.clone(),
            config: self.config.clone(),
            schedule_position: runner.schedule_position(),
        };
        self.checkpoints.save_state(tag, &state)?;
        info!("Saving checkpoint: {} ...", tag);
        Ok(())
    }
}

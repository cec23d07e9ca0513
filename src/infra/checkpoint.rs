// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores training state using Burn's CompactRecorder.
//
// What gets saved per checkpoint tag (e.g. "epoch10", "best"):
//   1. model_{tag}.mpk.gz  — model parameters
//   2. optim_{tag}.mpk.gz  — optimiser state (Adam moments)
//   3. state_{tag}.json    — epoch, monitor best, history, config
//
// Plus, per run directory:
//   latest_epoch.json  — tag of the newest periodic checkpoint
//   train_config.json  — the config the run was started with
//
// File layout:
//   saved/<run name>/
//     model_epoch5.mpk.gz
//     optim_epoch5.mpk.gz
//     state_epoch5.json
//     model_best.mpk.gz
//     ...
//     latest_epoch.json
//     train_config.json
//     metrics.csv
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Record, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::application::config::TrainerConfig;
use crate::domain::summary::TrainingHistory;

// ─── TrainingState ────────────────────────────────────────────────────────────
/// Everything besides tensors that a resumed run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub epoch:             usize,
    pub monitor_best:      Option<f64>,
    pub not_improved:      usize,
    pub history:           TrainingHistory,
    pub config:            TrainerConfig,
    pub schedule_position: Option<usize>,
}

// ─── CheckpointManager ────────────────────────────────────────────────────────
/// Manages the files of one run directory.
pub struct CheckpointManager {
    dir:      PathBuf,
    recorder: CompactRecorder,
}

impl CheckpointManager {
    /// Create the manager, creating `dir` (and parents) if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir, recorder: CompactRecorder::new() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save a module's parameters as `{name}.mpk.gz`.
    pub fn save_module<B: Backend, M: Module<B>>(&self, module: &M, name: &str) -> Result<()> {
        let path = self.dir.join(name);
        module
            .clone()
            .save_file(path.clone(), &self.recorder)
            .with_context(|| format!("Failed to save module to '{}'", path.display()))?;
        tracing::debug!("Saved module '{}'", path.display());
        Ok(())
    }

    /// Load parameters saved by `save_module` into `module`.
    /// Fails if the architecture does not match.
    pub fn load_module<B: Backend, M: Module<B>>(&self, module: M, name: &str, device: &B::Device) -> Result<M> {
        let path = self.dir.join(name);
        module
            .load_file(path.clone(), &self.recorder, device)
            .with_context(|| format!("Cannot load module from '{}'", path.display()))
    }

    /// Save any Burn record (e.g. an optimiser record) as `{name}.mpk.gz`.
    pub fn save_record<B: Backend, R: Record<B>>(&self, record: R, name: &str) -> Result<()> {
        let path = self.dir.join(name);
        Recorder::<B>::record(&self.recorder, record, path.clone())
            .with_context(|| format!("Failed to save record to '{}'", path.display()))?;
        tracing::debug!("Saved record '{}'", path.display());
        Ok(())
    }

    pub fn load_record<B: Backend, R: Record<B>>(&self, name: &str, device: &B::Device) -> Result<R> {
        let path = self.dir.join(name);
        Recorder::<B>::load(&self.recorder, path.clone(), device)
            .with_context(|| format!("Cannot load record from '{}'", path.display()))
    }

    pub fn save_state(&self, tag: &str, state: &TrainingState) -> Result<()> {
        write_json(&self.dir.join(format!("state_{tag}.json")), state)
    }

    pub fn load_state(&self, tag: &str) -> Result<TrainingState> {
        let path = self.dir.join(format!("state_{tag}.json"));
        read_json(&path).with_context(|| {
            format!("No training state for checkpoint '{tag}'. Was it saved in this run directory?")
        })
    }

    /// Record `tag` as the newest periodic checkpoint.
    pub fn set_latest(&self, tag: &str) -> Result<()> {
        write_json(&self.dir.join("latest_epoch.json"), &tag)
    }

    /// Tag of the newest periodic checkpoint.
    pub fn latest(&self) -> Result<String> {
        read_json(&self.dir.join("latest_epoch.json"))
            .context("Cannot find 'latest_epoch.json'. Has this run saved a checkpoint yet?")
    }

    pub fn save_config(&self, cfg: &TrainerConfig) -> Result<()> {
        write_json(&self.dir.join("train_config.json"), cfg)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
    tracing::debug!("Wrote '{}'", path.display());
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Malformed JSON in '{}'", path.display()))
}

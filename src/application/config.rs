// ============================================================
// Layer 2 — Trainer Configuration
// ============================================================
// All knobs for a training run, loaded from one JSON file:
//
//   {
//     "name": "matting",
//     "data_loader":  { "batch_size": 16, "shuffle": true,
//                       "validation_split": 0.1, "seed": 42 },
//     "optimizer":    { "lr": 1e-4, "beta_1": 0.9, "beta_2": 0.999,
//                       "epsilon": 1e-8, "weight_decay": null },
//     "lr_scheduler": { "type": "StepLR", "step_size": 50, "gamma": 0.1 },
//     "trainer":      { "epochs": 100, "save_dir": "saved",
//                       "save_period": 1, "verbosity": 2,
//                       "monitor": "min val_loss", "early_stop": 10,
//                       "tensorboard": true }
//   }
//
// The config is copied into the run directory at start-up and
// into every checkpoint, so a resumed run can tell whether its
// optimiser settings changed.

use std::{fmt, fs, path::Path, str::FromStr};

use anyhow::{bail, ensure, Context, Result};
use burn::optim::{decay::WeightDecayConfig, AdamConfig};
use serde::{Deserialize, Serialize};

use crate::ml::schedule::ScheduleConfig;

// ─── Sections ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub batch_size:       usize,
    pub shuffle:          bool,
    /// Fraction of samples moved to validation, in [0, 1)
    pub validation_split: f64,
    pub seed:             u64,
}

/// Adam hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub lr:           f64,
    pub beta_1:       f32,
    pub beta_2:       f32,
    pub epsilon:      f32,
    #[serde(default)]
    pub weight_decay: Option<f32>,
}

impl OptimizerConfig {
    pub fn adam(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(self.beta_1)
            .with_beta_2(self.beta_2)
            .with_epsilon(self.epsilon)
            .with_weight_decay(self.weight_decay.map(WeightDecayConfig::new))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    pub epochs:      usize,
    pub save_dir:    String,
    /// Save a periodic checkpoint every this many epochs
    pub save_period: usize,
    pub verbosity:   u8,
    /// "off", "min <key>" or "max <key>"
    pub monitor:     String,
    /// Stop after this many epochs without improvement; 0 disables
    pub early_stop:  usize,
    /// Write scalars and image grids under <run dir>/log
    pub tensorboard: bool,
}

// ─── TrainerConfig ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub name:         String,
    pub data_loader:  LoaderConfig,
    pub optimizer:    OptimizerConfig,
    #[serde(default)]
    pub lr_scheduler: Option<ScheduleConfig>,
    pub trainer:      SupervisorConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            name: "matting".to_string(),
            data_loader: LoaderConfig {
                batch_size:       16,
                shuffle:          true,
                validation_split: 0.1,
                seed:             42,
            },
            optimizer: OptimizerConfig {
                lr:           1e-4,
                beta_1:       0.9,
                beta_2:       0.999,
                epsilon:      1e-8,
                weight_decay: None,
            },
            lr_scheduler: Some(ScheduleConfig::Step { step_size: 50, gamma: 0.1 }),
            trainer: SupervisorConfig {
                epochs:      100,
                save_dir:    "saved".to_string(),
                save_period: 1,
                verbosity:   2,
                monitor:     "min val_loss".to_string(),
                early_stop:  10,
                tensorboard: true,
            },
        }
    }
}

impl TrainerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Cannot write config '{}'", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.name.is_empty(), "name must not be empty");
        ensure!(self.data_loader.batch_size > 0, "data_loader.batch_size must be at least 1");
        ensure!(
            (0.0..1.0).contains(&self.data_loader.validation_split),
            "data_loader.validation_split must be in [0, 1), got {}",
            self.data_loader.validation_split
        );
        ensure!(self.optimizer.lr > 0.0, "optimizer.lr must be positive");
        ensure!(self.trainer.epochs > 0, "trainer.epochs must be at least 1");
        ensure!(self.trainer.save_period > 0, "trainer.save_period must be at least 1");
        if let Some(schedule) = &self.lr_scheduler {
            schedule.validate()?;
        }
        self.monitor()?;
        Ok(())
    }

    pub fn monitor(&self) -> Result<Monitor> {
        self.trainer.monitor.parse()
    }
}

// ─── Monitor ──────────────────────────────────────────────────────────────────
/// Which logged value decides "best" and early stopping.
#[derive(Debug, Clone, PartialEq)]
pub enum Monitor {
    Off,
    Min(String),
    Max(String),
}

impl Monitor {
    pub fn key(&self) -> Option<&str> {
        match self {
            Monitor::Off => None,
            Monitor::Min(key) | Monitor::Max(key) => Some(key),
        }
    }

    /// True if `value` beats `best` (or there is no best yet).
    pub fn improved(&self, value: f64, best: Option<f64>) -> bool {
        match (self, best) {
            (Monitor::Off, _)          => false,
            (_, None)                  => true,
            (Monitor::Min(_), Some(b)) => value < b,
            (Monitor::Max(_), Some(b)) => value > b,
        }
    }
}

impl FromStr for Monitor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.as_slice() {
            ["off"]        => Ok(Monitor::Off),
            ["min", key]   => Ok(Monitor::Min(key.to_string())),
            ["max", key]   => Ok(Monitor::Max(key.to_string())),
            _ => bail!("monitor must be \"off\", \"min <key>\" or \"max <key>\", got {s:?}"),
        }
    }
}

impl fmt::Display for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Monitor::Off      => f.write_str("off"),
            Monitor::Min(key) => write!(f, "min {key}"),
            Monitor::Max(key) => write!(f, "max {key}"),
        }
    }
}

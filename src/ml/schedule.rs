// ============================================================
// Layer 5 — Learning-Rate Schedules
// ============================================================
// Epoch-level schedules. The trainer reads lr() before every
// optimiser step and calls step() once at the end of each
// epoch, after validation.
//
//   StepLR:        lr = base_lr · gamma^floor(epoch / step_size)
//   ExponentialLR: lr = base_lr · gamma^epoch
//
// "epoch" here is last_epoch, the number of step() calls so far.
//
// Reference: Loshchilov & Hutter (2017) SGDR, §2 (step decay)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::domain::traits::LrSchedule;

// ─── ScheduleConfig ───────────────────────────────────────────────────────────
/// Serialised form of a schedule inside the trainer config:
///
/// ```json
/// { "type": "StepLR", "step_size": 50, "gamma": 0.1 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScheduleConfig {
    #[serde(rename = "StepLR")]
    Step { step_size: usize, gamma: f64 },

    #[serde(rename = "ExponentialLR")]
    Exponential { gamma: f64 },
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            ScheduleConfig::Step { step_size, gamma } => {
                ensure!(*step_size > 0, "StepLR step_size must be at least 1");
                ensure!(*gamma > 0.0, "StepLR gamma must be positive, got {gamma}");
            }
            ScheduleConfig::Exponential { gamma } => {
                ensure!(*gamma > 0.0, "ExponentialLR gamma must be positive, got {gamma}");
            }
        }
        Ok(())
    }

    /// Build the schedule starting from `base_lr`.
    pub fn init(&self, base_lr: f64) -> Box<dyn LrSchedule> {
        match *self {
            ScheduleConfig::Step { step_size, gamma } => {
                Box::new(StepLr::new(base_lr, step_size, gamma))
            }
            ScheduleConfig::Exponential { gamma } => Box::new(ExponentialLr::new(base_lr, gamma)),
        }
    }
}

// ─── StepLr ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct StepLr {
    base_lr:    f64,
    step_size:  usize,
    gamma:      f64,
    last_epoch: usize,
}

impl StepLr {
    pub fn new(base_lr: f64, step_size: usize, gamma: f64) -> Self {
        Self { base_lr, step_size: step_size.max(1), gamma, last_epoch: 0 }
    }
}

impl LrSchedule for StepLr {
    fn lr(&self) -> f64 {
        let decays = (self.last_epoch / self.step_size) as i32;
        self.base_lr * self.gamma.powi(decays)
    }

    fn step(&mut self) {
        self.last_epoch += 1;
    }

    fn last_epoch(&self) -> usize {
        self.last_epoch
    }

    fn set_last_epoch(&mut self, epoch: usize) {
        self.last_epoch = epoch;
    }
}

// ─── ExponentialLr ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialLr {
    base_lr:    f64,
    gamma:      f64,
    last_epoch: usize,
}

impl ExponentialLr {
    pub fn new(base_lr: f64, gamma: f64) -> Self {
        Self { base_lr, gamma, last_epoch: 0 }
    }
}

impl LrSchedule for ExponentialLr {
    fn lr(&self) -> f64 {
        self.base_lr * self.gamma.powi(self.last_epoch as i32)
    }

    fn step(&mut self) {
        self.last_epoch += 1;
    }

    fn last_epoch(&self) -> usize {
        self.last_epoch
    }

    fn set_last_epoch(&mut self, epoch: usize) {
        self.last_epoch = epoch;
    }
}

// ============================================================
// Layer 3 — Collaborator Traits
// ============================================================
// The epoch orchestrator talks to two collaborators that carry
// no tensor types at all: a diagnostics sink that records
// scalars and pictures, and an optional learning-rate schedule.
// Everything tensor-shaped (model, loss, metrics, batches)
// lives in the ml and data layers.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::grid::ImageGrid;

// ─── Mode ─────────────────────────────────────────────────────────────────────
/// Namespace for diagnostics so training and validation curves
/// stay apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Train,
    Valid,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Valid => "valid",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── DiagnosticsSink ──────────────────────────────────────────────────────────
/// Records scalar curves and image snapshots keyed by step.
///
/// Implementations:
///   - RunWriter  → CSV scalars + PPM images under a log directory
///   - NullWriter → discards everything
pub trait DiagnosticsSink {
    /// Set the step (and namespace) used by every following emission.
    fn set_step(&mut self, step: usize, mode: Mode) -> Result<()>;

    /// Record a named scalar at the current step.
    fn add_scalar(&mut self, tag: &str, value: f64) -> Result<()>;

    /// Record a named image at the current step.
    fn add_image(&mut self, tag: &str, image: &ImageGrid) -> Result<()>;
}

// ─── LrSchedule ───────────────────────────────────────────────────────────────
/// A learning-rate schedule advanced once per epoch.
///
/// Implementations:
///   - StepLr        → decays by gamma every step_size epochs
///   - ExponentialLr → decays by gamma every epoch
pub trait LrSchedule {
    /// Learning rate to use for the current epoch.
    fn lr(&self) -> f64;

    /// Advance by one epoch.
    fn step(&mut self);

    /// Number of times `step` has been called.
    fn last_epoch(&self) -> usize;

    /// Jump to a position, used when resuming a run.
    fn set_last_epoch(&mut self, epoch: usize);
}

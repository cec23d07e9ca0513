// ============================================================
// Layer 5 — ML Layer (Burn)
// ============================================================
// All Burn-specific training code lives here.
//
//   model.rs    — MattingModel and MattingLoss contracts the
//                 caller's network and loss implement
//   metrics.rs  — MetricSet (ordered named metrics) and the
//                 per-pass accumulator
//   grid.rs     — turns a [N, C, H, W] tensor into an ImageGrid
//   schedule.rs — per-epoch learning-rate schedules
//   trainer.rs  — the train pass, the validation pass and the
//                 epoch orchestrator
//
// Reference: Burn Book §5 (Training)

/// Model and loss contracts
pub mod model;

/// Metric aggregation and pass accumulators
pub mod metrics;

/// Image grids for diagnostics
pub mod grid;

/// Learning-rate schedules
pub mod schedule;

/// Epoch executors and orchestrator
pub mod trainer;

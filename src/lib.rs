// ============================================================
// matting-trainer
// ============================================================
// Epoch orchestration for multi-scale image matting models:
// training and validation passes, metric aggregation, image
// diagnostics, learning-rate schedules, checkpoints and resume.
//
//   Layer 1 — cli          argument parsing, printing
//   Layer 2 — application  config, supervisor, use case wiring
//   Layer 3 — domain       summaries, image grids, collaborator traits
//   Layer 4 — data         samples, batches, loaders
//   Layer 5 — ml           metrics, grids, schedules, the trainer
//   Layer 6 — infra        checkpoints, CSV logs, writers, tracing
#![recursion_limit = "256"]

pub mod cli;
pub mod application;
pub mod domain;
pub mod data;
pub mod ml;
pub mod infra;

#[cfg(test)]
pub(crate) mod test_support;

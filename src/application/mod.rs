// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Coordinates the other layers into a training run:
//
//   config.rs         — TrainerConfig (JSON) and the Monitor rule
//   supervisor.rs     — the multi-epoch loop: monitoring, early
//                       stopping, checkpoints and resume
//   train_use_case.rs — builds loaders, optimiser, schedule,
//                       writer, trainer and supervisor from a
//                       config and runs them
//
// Rules for this layer:
//   - No tensor math here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Run configuration
pub mod config;

/// Epoch loop, checkpoints and resume
pub mod supervisor;

/// The training workflow
pub mod train_use_case;

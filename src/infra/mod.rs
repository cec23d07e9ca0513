// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or the process:
//
//   checkpoint.rs — model and optimiser records (CompactRecorder),
//                   training state JSON, the latest-tag pointer
//
//   metrics.rs    — one CSV row per epoch in metrics.csv
//
//   writer.rs     — DiagnosticsSink implementations: RunWriter
//                   (scalars CSV + PPM image grids) and NullWriter
//
//   logging.rs    — tracing subscriber setup
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model, optimiser and state checkpoints
pub mod checkpoint;

/// Epoch metrics CSV logger
pub mod metrics;

/// Diagnostics sinks
pub mod writer;

/// tracing subscriber initialisation
pub mod logging;

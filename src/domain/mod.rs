// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what a training run
// produces and who it talks to:
//
//   summary.rs — PassSummary, EpochLog, LogEntry, TrainingHistory
//   grid.rs    — ImageGrid, a host-side picture for diagnostics
//   traits.rs  — DiagnosticsSink and LrSchedule collaborators
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Per-pass and per-epoch summaries plus the run history
pub mod summary;

/// Host-side image grids emitted to diagnostics sinks
pub mod grid;

/// Collaborator traits implemented outside the domain
pub mod traits;

// ============================================================
// Layer 6 — Logging Setup
// ============================================================
// Installs the tracing subscriber for the binary.
//
// Trainer verbosity maps to the crate's default level:
//   0 → warn
//   1 → info   (epoch summaries)
//   2 → debug  (progress lines, checkpoint details)
//
// RUST_LOG directives still apply on top of this default.

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// Initialise a global fmt subscriber. Fails if one is already set.
pub fn init_tracing(verbosity: u8) -> Result<()> {
    let level     = level_for(verbosity).as_str().to_ascii_lowercase();
    let directive = format!("matting_trainer={level}").parse()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .try_init()
        .map_err(|e| anyhow!("cannot install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), Level::WARN);
        assert_eq!(level_for(1), Level::INFO);
        assert_eq!(level_for(2), Level::DEBUG);
        assert_eq!(level_for(9), Level::DEBUG);
    }
}

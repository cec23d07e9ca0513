// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per epoch to <run dir>/metrics.csv.
//
// Columns come from the training history: epoch, loss, one per
// metric, then val_loss and val_<metric> when validation runs.
//
// Example CSV output (metrics "sad" and "mse", with validation):
//   epoch,loss,sad,mse,val_loss,val_sad,val_mse
//   1,0.082300,31.200000,0.011200,0.090100,33.900000,0.012800
//   2,0.061700,25.400000,0.008300,0.071200,28.100000,0.009900
//
// A missing value (no validation that epoch) is an empty cell.
// Resumed runs append to the same file.
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::domain::summary::LogEntry;

/// Logs epoch entries to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
    columns:  Vec<String>,
}

impl MetricsLogger {
    /// Open `<dir>/metrics.csv`, writing the header if the file is new.
    pub fn new(dir: impl AsRef<Path>, columns: Vec<String>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{}", columns.join(","))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path, columns })
    }

    /// Append one row. Columns after `epoch` are looked up by name.
    pub fn log(&self, entry: &LogEntry, metric_names: &[String]) -> Result<()> {
        let mut row = vec![entry.epoch.to_string()];
        for column in self.columns.iter().skip(1) {
            let cell = entry
                .value(column, metric_names)
                .map(|v| format!("{v:.6}"))
                .unwrap_or_default();
            row.push(cell);
        }

        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        writeln!(f, "{}", row.join(","))?;

        tracing::debug!("Logged epoch {} to '{}'", entry.epoch, self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ============================================================
// Layer 6 — Diagnostics Writers
// ============================================================
// DiagnosticsSink implementations.
//
// RunWriter lays a run's diagnostics out on disk:
//
//   <log_dir>/
//     scalars.csv                  step,tag,value
//                                  tags are "<name>/<mode>",
//                                  e.g. "loss/train", "sad/valid"
//     images/train/input_00000040.ppm
//     images/valid/output_00000012.ppm
//
// Whenever the step moves to a non-zero value, the writer also
// records "steps_per_sec": one over the wall time since the
// previous set_step call.
//
// NullWriter drops everything; it is what the trainer uses when
// no writer is configured.

use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};

use crate::domain::grid::ImageGrid;
use crate::domain::traits::{DiagnosticsSink, Mode};

// ─── RunWriter ────────────────────────────────────────────────────────────────
pub struct RunWriter {
    log_dir: PathBuf,
    scalars: BufWriter<File>,
    step:    usize,
    mode:    Mode,
    timer:   Instant,
}

impl RunWriter {
    /// Open (or continue) the diagnostics of `log_dir`.
    pub fn new(log_dir: impl Into<PathBuf>) -> Result<Self> {
        let log_dir = log_dir.into();
        fs::create_dir_all(&log_dir)
            .with_context(|| format!("Cannot create log directory '{}'", log_dir.display()))?;

        let csv_path = log_dir.join("scalars.csv");
        let is_new   = !csv_path.exists();
        let file     = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&csv_path)
            .with_context(|| format!("Cannot open '{}'", csv_path.display()))?;

        let mut scalars = BufWriter::new(file);
        if is_new {
            writeln!(scalars, "step,tag,value")?;
        }
        tracing::debug!("Writing diagnostics to '{}'", log_dir.display());

        Ok(Self { log_dir, scalars, step: 0, mode: Mode::Train, timer: Instant::now() })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Push buffered scalars to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.scalars.flush()?;
        Ok(())
    }

    fn image_path(&self, tag: &str) -> PathBuf {
        self.log_dir
            .join("images")
            .join(self.mode.as_str())
            .join(format!("{}_{:08}.ppm", tag, self.step))
    }
}

impl DiagnosticsSink for RunWriter {
    fn set_step(&mut self, step: usize, mode: Mode) -> Result<()> {
        self.step = step;
        self.mode = mode;
        if step != 0 {
            let secs = self.timer.elapsed().as_secs_f64();
            if secs > 0.0 {
                self.add_scalar("steps_per_sec", 1.0 / secs)?;
            }
        }
        self.timer = Instant::now();
        Ok(())
    }

    fn add_scalar(&mut self, tag: &str, value: f64) -> Result<()> {
        writeln!(self.scalars, "{},{}/{},{}", self.step, tag, self.mode, value)?;
        Ok(())
    }

    fn add_image(&mut self, tag: &str, image: &ImageGrid) -> Result<()> {
        let path = self.image_path(tag);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // binary PPM: "P6\n<w> <h>\n255\n" then RGB bytes, row-major
        let mut bytes = format!("P6\n{} {}\n255\n", image.width, image.height).into_bytes();
        bytes.extend(image.to_rgb8());
        fs::write(&path, bytes).with_context(|| format!("Cannot write image '{}'", path.display()))?;
        Ok(())
    }
}

impl Drop for RunWriter {
    fn drop(&mut self) {
        if let Err(e) = self.scalars.flush() {
            tracing::warn!("Failed to flush diagnostics in '{}': {}", self.log_dir.display(), e);
        }
    }
}

// ─── NullWriter ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWriter;

impl DiagnosticsSink for NullWriter {
    fn set_step(&mut self, _step: usize, _mode: Mode) -> Result<()> {
        Ok(())
    }

    fn add_scalar(&mut self, _tag: &str, _value: f64) -> Result<()> {
        Ok(())
    }

    fn add_image(&mut self, _tag: &str, _image: &ImageGrid) -> Result<()> {
        Ok(())
    }
}

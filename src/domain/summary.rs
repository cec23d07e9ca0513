// ============================================================
// Layer 3 — Epoch Summaries
// ============================================================
// A pass (one sweep over a batch source) ends in a PassSummary.
// An epoch is one training pass plus at most one validation
// pass, so the orchestrator merges the two into an EpochLog:
//
//   {
//     "loss":        0.0412,
//     "metrics":     [12.5, 0.0031],
//     "val_loss":    0.0520,          ← only when validation ran
//     "val_metrics": [14.1, 0.0040]   ← only when validation ran
//   }
//
// All values are averaged over the NUMBER OF BATCHES in the
// pass, not over the number of samples. A short final batch
// therefore counts as much as a full one.

use serde::{Deserialize, Serialize};

/// Mean loss and mean metric values over one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Running loss divided by the pass length
    pub loss: f64,

    /// Running metric sums divided by the pass length,
    /// in the same order as the configured metric set
    pub metrics: Vec<f64>,
}

/// The merged result of one epoch, returned to the supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochLog {
    pub loss:    f64,
    pub metrics: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_loss: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_metrics: Option<Vec<f64>>,
}

impl EpochLog {
    /// Start an epoch log from the training pass alone.
    pub fn from_train(train: PassSummary) -> Self {
        Self {
            loss:        train.loss,
            metrics:     train.metrics,
            val_loss:    None,
            val_metrics: None,
        }
    }

    /// Merge a validation pass under the `val_` keys.
    /// Training keys are never touched.
    pub fn merge_validation(mut self, valid: PassSummary) -> Self {
        self.val_loss    = Some(valid.loss);
        self.val_metrics = Some(valid.metrics);
        self
    }

    pub fn has_validation(&self) -> bool {
        self.val_loss.is_some()
    }

    /// Expand the log into named scalars:
    /// `loss`, one entry per metric name, then `val_loss` and
    /// `val_<metric>` when validation ran.
    pub fn entries(&self, metric_names: &[String]) -> Vec<(String, f64)> {
        let mut out = Vec::with_capacity(2 + 2 * metric_names.len());
        out.push(("loss".to_string(), self.loss));
        for (name, value) in metric_names.iter().zip(&self.metrics) {
            out.push((name.clone(), *value));
        }

        if let Some(val_loss) = self.val_loss {
            out.push(("val_loss".to_string(), val_loss));
        }
        if let Some(val_metrics) = &self.val_metrics {
            for (name, value) in metric_names.iter().zip(val_metrics) {
                out.push((format!("val_{name}"), *value));
            }
        }
        out
    }
}

// ─── LogEntry ─────────────────────────────────────────────────────────────────
/// One row of the training history: the epoch number plus its log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub epoch: usize,

    #[serde(flatten)]
    pub log: EpochLog,
}

impl LogEntry {
    pub fn new(epoch: usize, log: EpochLog) -> Self {
        Self { epoch, log }
    }

    /// Look up a named value (`loss`, `val_loss`, a metric name or
    /// `val_<metric>`). Returns None if the key is not present.
    pub fn value(&self, key: &str, metric_names: &[String]) -> Option<f64> {
        self.log
            .entries(metric_names)
            .into_iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

// ─── TrainingHistory ──────────────────────────────────────────────────────────
/// Every epoch log of a run, in order. Saved inside checkpoints
/// so a resumed run keeps its earlier epochs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub metric_names: Vec<String>,
    pub entries:      Vec<LogEntry>,
}

impl TrainingHistory {
    pub fn new(metric_names: Vec<String>) -> Self {
        Self { metric_names, entries: Vec::new() }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column names for tabular output, `epoch` first.
    pub fn columns(&self, with_validation: bool) -> Vec<String> {
        let mut cols = vec!["epoch".to_string(), "loss".to_string()];
        cols.extend(self.metric_names.iter().cloned());
        if with_validation {
            cols.push("val_loss".to_string());
            cols.extend(self.metric_names.iter().map(|n| format!("val_{n}")));
        }
        cols
    }
}

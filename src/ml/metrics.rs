// ============================================================
// Layer 5 — Metric Aggregation
// ============================================================
// A MetricSet is an ordered list of (name, metric) pairs fixed
// when the trainer is built. evaluate() walks it by position,
// so the returned vector always lines up with names():
//
//   names()    = ["sad", "mse", "grad"]
//   evaluate() = [ 12.3, 0.004,  3.10 ]
//
// Each value is also sent to the diagnostics sink under the
// metric's name at whatever step the sink currently holds.
//
// A PassAccumulator sums losses and metric vectors over one
// pass and divides by the pass length at the end. A source that
// yields a different number of batches than its len() is an
// error, not a silently skewed mean.

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::domain::summary::PassSummary;
use crate::domain::traits::DiagnosticsSink;

// ─── Metric ───────────────────────────────────────────────────────────────────
/// A read-only score of a prediction against its target.
pub trait Metric<B: Backend> {
    fn compute(&self, output: &Tensor<B, 4>, target: &Tensor<B, 4>) -> Result<f64>;
}

impl<B, F> Metric<B> for F
where
    B: Backend,
    F: Fn(&Tensor<B, 4>, &Tensor<B, 4>) -> Result<f64>,
{
    fn compute(&self, output: &Tensor<B, 4>, target: &Tensor<B, 4>) -> Result<f64> {
        self(output, target)
    }
}

// ─── MetricSet ────────────────────────────────────────────────────────────────
pub struct MetricSet<B: Backend> {
    metrics: Vec<(String, Box<dyn Metric<B>>)>,
}

impl<B: Backend> Default for MetricSet<B> {
    fn default() -> Self {
        Self { metrics: Vec::new() }
    }
}

impl<B: Backend> MetricSet<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a metric. Its position is its index in every summary.
    pub fn with(mut self, name: impl Into<String>, metric: impl Metric<B> + 'static) -> Self {
        self.metrics.push((name.into(), Box::new(metric)));
        self
    }

    /// Append a closure metric.
    pub fn with_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Tensor<B, 4>, &Tensor<B, 4>) -> Result<f64> + 'static,
    {
        self.with(name, f)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.metrics.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Score `output` against `target` with every metric, in order,
    /// forwarding each value to `sink`. The first failing metric
    /// aborts the evaluation.
    pub fn evaluate(
        &self,
        output: &Tensor<B, 4>,
        target: &Tensor<B, 4>,
        sink:   &mut dyn DiagnosticsSink,
    ) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(self.metrics.len());
        for (name, metric) in &self.metrics {
            let value = metric.compute(output, target)?;
            sink.add_scalar(name, value)?;
            values.push(value);
        }
        Ok(values)
    }
}

// ─── PassAccumulator ──────────────────────────────────────────────────────────
/// Running totals for one pass. Create a new one per pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassAccumulator {
    loss_sum:    f64,
    metric_sums: Vec<f64>,
    batches:     usize,
}

impl PassAccumulator {
    pub fn new(n_metrics: usize) -> Self {
        Self { loss_sum: 0.0, metric_sums: vec![0.0; n_metrics], batches: 0 }
    }

    pub fn add(&mut self, loss: f64, metrics: &[f64]) {
        debug_assert_eq!(metrics.len(), self.metric_sums.len());
        self.loss_sum += loss;
        for (sum, value) in self.metric_sums.iter_mut().zip(metrics) {
            *sum += value;
        }
        self.batches += 1;
    }

    /// Divide the totals by `pass_length` (the batch count of the
    /// source), element-wise for the metrics.
    pub fn finish(self, pass_length: usize) -> Result<PassSummary> {
        ensure!(
            self.batches == pass_length,
            "pass yielded {} batches but its source reports {}",
            self.batches,
            pass_length
        );
        let n = pass_length as f64;
        Ok(PassSummary {
            loss:    self.loss_sum / n,
            metrics: self.metric_sums.into_iter().map(|sum| sum / n).collect(),
        })
    }
}

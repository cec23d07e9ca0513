// ============================================================
// Layer 5 — Epoch Executors and Orchestrator
// ============================================================
// One epoch = one training pass + at most one validation pass
// + at most one learning-rate schedule step.
//
// Training pass, per batch:
//   1. move the batch to the training device
//   2. prediction = model(image_scale1, image_scale2, image_scale3)
//   3. loss = loss_fn(prediction, gt)
//   4. backward, then one optimiser step at the current lr
//      (gradients are collected fresh from each loss, so nothing
//       leaks into the next batch)
//   5. set the sink step to (epoch - 1) · len + batch_idx
//   6. record the loss, score the metrics, accumulate both
//   7. at verbosity ≥ 2, every log_step batches: progress line
//      plus input / gt / output image grids
//
// Validation pass: the same without step 4, on the inner
// (non-autodiff) backend through model.valid(), with images
// emitted on every batch under the `valid` namespace.
//
// Both passes divide their sums by the number of batches in
// the source, not by the number of samples.
//
// Key Burn insight:
//   - Training runs on B (Autodiff<_>) so backward() works
//   - model.valid() returns the same weights on B::InnerBackend
//   - Metrics always run on inner tensors (tensor.inner()), so one
//     MetricSet serves both passes and never joins the graph
//
// Reference: Burn Book §5 (Custom Training Loop)

use anyhow::{ensure, Context, Result};
use burn::{
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use tracing::{debug, info};

use crate::application::supervisor::{Checkpointable, EpochRunner};
use crate::data::batch::BatchSource;
use crate::domain::summary::{EpochLog, PassSummary};
use crate::domain::traits::{DiagnosticsSink, LrSchedule, Mode};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::writer::NullWriter;
use crate::ml::grid::make_grid;
use crate::ml::metrics::{MetricSet, PassAccumulator};
use crate::ml::model::{MattingLoss, MattingModel};

/// Samples per row in diagnostic image grids.
const GRID_NROW: usize = 8;

/// Verbosity at which the training pass logs progress and images.
const PROGRESS_VERBOSITY: u8 = 2;

// ─── Cadence helpers ──────────────────────────────────────────────────────────

/// floor(sqrt(batch_size)), never below 1.
pub fn log_step_for(batch_size: usize) -> usize {
    let mut root = (batch_size as f64).sqrt() as usize;
    // correct float rounding at perfect squares
    while root * root > batch_size {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= batch_size {
        root += 1;
    }
    root.max(1)
}

/// Diagnostics step of a batch: continues across epochs.
pub fn global_step(epoch: usize, pass_length: usize, batch_idx: usize) -> usize {
    epoch.saturating_sub(1) * pass_length + batch_idx
}

pub fn should_log(verbosity: u8, batch_idx: usize, log_step: usize) -> bool {
    verbosity >= PROGRESS_VERBOSITY && batch_idx % log_step == 0
}

/// `[samples seen/total (batches seen %)]`; the percentage counts
/// batches, so a short last batch does not skew it.
fn progress(batch_idx: usize, batch_size: usize, n_samples: usize, pass_length: usize) -> String {
    let current = batch_idx * batch_size;
    let percent = if pass_length == 0 { 0.0 } else { 100.0 * batch_idx as f64 / pass_length as f64 };
    format!("[{}/{} ({:.0}%)]", current, n_samples, percent)
}

// ─── TrainerContext ───────────────────────────────────────────────────────────
/// What the supervisor hands the trainer at construction.
#[derive(Debug, Clone)]
pub struct TrainerContext<B: Backend> {
    pub device:    B::Device,
    pub verbosity: u8,
    /// Learning rate used when no schedule is configured
    pub lr:        f64,
}

// ─── MattingTrainer ───────────────────────────────────────────────────────────
pub struct MattingTrainer<B, M, O, L>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    model:             M,
    optim:             O,
    loss:              L,
    metrics:           MetricSet<B::InnerBackend>,
    data_loader:       Box<dyn BatchSource<B>>,
    valid_data_loader: Option<Box<dyn BatchSource<B::InnerBackend>>>,
    lr_scheduler:      Option<Box<dyn LrSchedule>>,
    writer:            Box<dyn DiagnosticsSink>,
    device:            B::Device,
    verbosity:         u8,
    base_lr:           f64,
    log_step:          usize,
}

impl<B, M, O, L> MattingTrainer<B, M, O, L>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + MattingModel<B>,
    M::InnerModule: MattingModel<B::InnerBackend>,
    O: Optimizer<M, B>,
    L: MattingLoss<B> + MattingLoss<B::InnerBackend>,
{
    /// Build a trainer with no validation, no schedule and a
    /// writer that discards diagnostics.
    pub fn new(
        model:       M,
        optim:       O,
        loss:        L,
        metrics:     MetricSet<B::InnerBackend>,
        data_loader: Box<dyn BatchSource<B>>,
        ctx:         TrainerContext<B>,
    ) -> Self {
        let log_step = log_step_for(data_loader.batch_size());
        debug!("batch_size={} → log_step={}", data_loader.batch_size(), log_step);
        Self {
            model,
            optim,
            loss,
            metrics,
            data_loader,
            valid_data_loader: None,
            lr_scheduler: None,
            writer: Box::new(NullWriter),
            device: ctx.device,
            verbosity: ctx.verbosity,
            base_lr: ctx.lr,
            log_step,
        }
    }

    pub fn with_writer(mut self, writer: Box<dyn DiagnosticsSink>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_validation(mut self, source: Box<dyn BatchSource<B::InnerBackend>>) -> Self {
        self.valid_data_loader = Some(source);
        self
    }

    pub fn with_lr_scheduler(mut self, schedule: Box<dyn LrSchedule>) -> Self {
        self.lr_scheduler = Some(schedule);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn log_step(&self) -> usize {
        self.log_step
    }

    /// Learning rate for the next optimiser step.
    pub fn current_lr(&self) -> f64 {
        self.lr_scheduler.as_ref().map_or(self.base_lr, |s| s.lr())
    }

    /// Run one training pass over the training source.
    pub fn train_epoch(&mut self, epoch: usize) -> Result<PassSummary> {
        let len = self.data_loader.len();
        ensure!(len > 0, "training data loader yields no batches");

        let lr         = self.current_lr();
        let batch_size = self.data_loader.batch_size();
        let n_samples  = self.data_loader.n_samples();
        let mut acc    = PassAccumulator::new(self.metrics.len());

        for (batch_idx, batch) in self.data_loader.iter().enumerate() {
            let batch = batch
                .with_context(|| format!("cannot load training batch {batch_idx} of epoch {epoch}"))?
                .to_device(&self.device);

            let output = self.model.forward(
                batch.image_scale1.clone(),
                batch.image_scale2.clone(),
                batch.image_scale3.clone(),
            );
            let loss       = MattingLoss::<B>::forward(&self.loss, &output, &batch.gt)?;
            let loss_value = loss.clone().into_scalar().elem::<f64>();
            ensure!(
                loss_value.is_finite(),
                "non-finite training loss ({loss_value}) at epoch {epoch}, batch {batch_idx}"
            );

            let grads  = loss.backward();
            let grads  = GradientsParams::from_grads(grads, &self.model);
            self.model = self.optim.step(lr, self.model.clone(), grads);

            self.writer.set_step(global_step(epoch, len, batch_idx), Mode::Train)?;
            self.writer.add_scalar("loss", loss_value)?;

            let output = output.inner();
            let gt     = batch.gt.inner();
            let values = self.metrics.evaluate(&output, &gt, self.writer.as_mut())?;
            acc.add(loss_value, &values);

            if should_log(self.verbosity, batch_idx, self.log_step) {
                info!(
                    "Train Epoch: {} {} Loss: {:.6}",
                    epoch,
                    progress(batch_idx, batch_size, n_samples, len),
                    loss_value,
                );
                self.writer.add_image("input", &make_grid(batch.image_scale1.inner(), GRID_NROW, true)?)?;
                self.writer.add_image("gt", &make_grid(gt, GRID_NROW, true)?)?;
                self.writer.add_image("output", &make_grid(output, GRID_NROW, true)?)?;
            }
        }

        acc.finish(len)
    }

    /// Run one validation pass. Errors if no validation source is
    /// configured.
    pub fn valid_epoch(&mut self, epoch: usize) -> Result<PassSummary> {
        let source = self
            .valid_data_loader
            .as_mut()
            .context("no validation data loader configured")?;
        let model = self.model.valid();
        validation_pass(
            &model,
            &self.loss,
            &self.metrics,
            source.as_mut(),
            self.writer.as_mut(),
            &self.device,
            epoch,
        )
    }
}

/// One validation pass of `model` over `source`, without gradient
/// tracking. Images are emitted on every batch.
pub fn validation_pass<VB, VM, L>(
    model:   &VM,
    loss:    &L,
    metrics: &MetricSet<VB>,
    source:  &mut dyn BatchSource<VB>,
    writer:  &mut dyn DiagnosticsSink,
    device:  &VB::Device,
    epoch:   usize,
) -> Result<PassSummary>
where
    VB: Backend,
    VM: MattingModel<VB>,
    L:  MattingLoss<VB>,
{
    let len = source.len();
    ensure!(len > 0, "validation data loader yields no batches");
    let mut acc = PassAccumulator::new(metrics.len());

    for (batch_idx, batch) in source.iter().enumerate() {
        let batch = batch
            .with_context(|| format!("cannot load validation batch {batch_idx} of epoch {epoch}"))?
            .to_device(device);

        let output = model.forward(
            batch.image_scale1.clone(),
            batch.image_scale2.clone(),
            batch.image_scale3.clone(),
        );
        let loss_value = loss.forward(&output, &batch.gt)?.into_scalar().elem::<f64>();

        writer.set_step(global_step(epoch, len, batch_idx), Mode::Valid)?;
        writer.add_scalar("loss", loss_value)?;
        let values = metrics.evaluate(&output, &batch.gt, writer)?;
        acc.add(loss_value, &values);

        writer.add_image("input", &make_grid(batch.image_scale1, GRID_NROW, true)?)?;
        writer.add_image("gt", &make_grid(batch.gt, GRID_NROW, true)?)?;
        writer.add_image("output", &make_grid(output, GRID_NROW, true)?)?;
    }

    acc.finish(len)
}

// ─── Orchestration ────────────────────────────────────────────────────────────
impl<B, M, O, L> EpochRunner for MattingTrainer<B, M, O, L>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + MattingModel<B>,
    M::InnerModule: MattingModel<B::InnerBackend>,
    O: Optimizer<M, B>,
    L: MattingLoss<B> + MattingLoss<B::InnerBackend>,
{
    fn run_epoch(&mut self, epoch: usize) -> Result<EpochLog> {
        let train = self.train_epoch(epoch)?;
        let mut log = EpochLog::from_train(train);

        if self.valid_data_loader.is_some() {
            let valid = self.valid_epoch(epoch)?;
            log = log.merge_validation(valid);
        }

        if let Some(schedule) = self.lr_scheduler.as_mut() {
            schedule.step();
            debug!("lr schedule stepped to epoch {} (lr={:.3e})", schedule.last_epoch(), schedule.lr());
        }

        Ok(log)
    }

    fn metric_names(&self) -> Vec<String> {
        self.metrics.names()
    }

    fn has_validation(&self) -> bool {
        self.valid_data_loader.is_some()
    }
}

// ─── Checkpointing ────────────────────────────────────────────────────────────
impl<B, M, O, L> Checkpointable for MattingTrainer<B, M, O, L>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + MattingModel<B>,
    M::InnerModule: MattingModel<B::InnerBackend>,
    O: Optimizer<M, B>,
    L: MattingLoss<B> + MattingLoss<B::InnerBackend>,
{
    fn save_checkpoint(&self, ckpt: &CheckpointManager, tag: &str) -> Result<()> {
        ckpt.save_module::<B, _>(&self.model, &format!("model_{tag}"))?;
        ckpt.save_record::<B, _>(self.optim.to_record(), &format!("optim_{tag}"))?;
        Ok(())
    }

    fn load_checkpoint(mut self, ckpt: &CheckpointManager, tag: &str, restore_optimizer: bool) -> Result<Self> {
        self.model = ckpt.load_module::<B, _>(self.model, &format!("model_{tag}"), &self.device)?;
        if restore_optimizer {
            let record = ckpt.load_record::<B, <O as Optimizer<M, B>>::Record>(&format!("optim_{tag}"), &self.device)?;
            self.optim = self.optim.load_record(record);
        }
        Ok(self)
    }

    fn schedule_position(&self) -> Option<usize> {
        self.lr_scheduler.as_ref().map(|s| s.last_epoch())
    }

    fn restore_schedule(&mut self, last_epoch: usize) {
        if let Some(schedule) = self.lr_scheduler.as_mut() {
            schedule.set_last_epoch(last_epoch);
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::MattingBatcher;
    use crate::data::dataset::MattingDataset;
    use crate::data::loader::MattingLoader;
    use crate::test_support::{
        dataset, sample, ConstLoss, CountingSchedule, GtMeanLoss, InnerBackend, OutputMeanLoss,
        RecordingSink, TestBackend, TinyMatting,
    };
    use approx::assert_abs_diff_eq;
    use burn::optim::{AdamConfig, SgdConfig};
    use proptest::prelude::*;

    fn ctx(verbosity: u8) -> TrainerContext<TestBackend> {
        TrainerContext { device: Default::default(), verbosity, lr: 1e-3 }
    }

    fn loader(n: usize, batch_size: usize) -> Box<dyn BatchSource<TestBackend>> {
        let batcher = MattingBatcher::new(Default::default());
        Box::new(MattingLoader::<TestBackend>::new(dataset(n), batcher, batch_size, None).unwrap())
    }

    fn valid_loader(n: usize, batch_size: usize) -> Box<dyn BatchSource<InnerBackend>> {
        let batcher = MattingBatcher::without_auxiliary(Default::default());
        Box::new(MattingLoader::<InnerBackend>::new(dataset(n), batcher, batch_size, None).unwrap())
    }

    fn half_metrics(n: usize) -> MetricSet<InnerBackend> {
        (0..n).fold(MetricSet::new(), |set, i| set.with_fn(format!("m{i}"), |_, _| Ok(0.5)))
    }

    fn trainer<L>(
        loss:      L,
        metrics:   MetricSet<InnerBackend>,
        source:    Box<dyn BatchSource<TestBackend>>,
        verbosity: u8,
    ) -> MattingTrainer<
        TestBackend,
        TinyMatting<TestBackend>,
        impl Optimizer<TinyMatting<TestBackend>, TestBackend>,
        L,
    >
    where
        L: MattingLoss<TestBackend> + MattingLoss<InnerBackend>,
    {
        let device = Default::default();
        let model  = TinyMatting::<TestBackend>::new(&device);
        let optim  = AdamConfig::new().init::<TestBackend, TinyMatting<TestBackend>>();
        MattingTrainer::new(model, optim, loss, metrics, source, ctx(verbosity))
    }

    #[test]
    fn test_log_step_is_integer_sqrt() {
        assert_eq!(log_step_for(1), 1);
        assert_eq!(log_step_for(3), 1);
        assert_eq!(log_step_for(4), 2);
        assert_eq!(log_step_for(16), 4);
        assert_eq!(log_step_for(17), 4);
        assert_eq!(log_step_for(64), 8);
        assert_eq!(log_step_for(0), 1);
    }

    #[test]
    fn test_global_step_continues_across_epochs() {
        assert_eq!(global_step(1, 10, 0), 0);
        assert_eq!(global_step(1, 10, 9), 9);
        assert_eq!(global_step(2, 10, 0), 10);
        assert_eq!(global_step(3, 4, 2), 10);
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(progress(0, 16, 160, 10), "[0/160 (0%)]");
        assert_eq!(progress(4, 16, 160, 10), "[64/160 (40%)]");
    }

    #[test]
    fn test_progress_percent_counts_batches_on_uneven_pass() {
        // 5 samples in batches of 2 → 3 batches, the last one short
        assert_eq!(progress(2, 2, 5, 3), "[4/5 (67%)]");
        assert_eq!(progress(1, 2, 5, 3), "[2/5 (33%)]");
    }

    #[test]
    fn test_log_gate_opens_every_log_step() {
        let logged: Vec<usize> = (0..10).filter(|&i| should_log(2, i, 4)).collect();
        assert_eq!(logged, vec![0, 4, 8]);
        assert!((0..10).all(|i| !should_log(1, i, 4)));
    }

    #[test]
    fn test_images_fire_every_log_step_at_high_verbosity() {
        // batch_size 16 → log_step 4; 160 samples → 10 batches
        let sink = RecordingSink::default();
        let mut t = trainer(GtMeanLoss, MetricSet::new(), loader(160, 16), 2)
            .with_writer(Box::new(sink.clone()));
        assert_eq!(t.log_step(), 4);
        t.train_epoch(1).unwrap();

        let images = sink.images();
        let steps: Vec<usize> = images.iter().filter(|e| e.tag == "input").map(|e| e.step).collect();
        assert_eq!(steps, vec![0, 4, 8]);
        let tags: Vec<&str> = images.iter().take(3).map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["input", "gt", "output"]);
        assert!(images.iter().all(|e| e.mode == Mode::Train));
    }

    #[test]
    fn test_no_images_below_progress_verbosity() {
        let sink = RecordingSink::default();
        let mut t = trainer(GtMeanLoss, MetricSet::new(), loader(32, 16), 1)
            .with_writer(Box::new(sink.clone()));
        t.train_epoch(1).unwrap();
        assert!(sink.images().is_empty());
        assert_eq!(sink.scalars().iter().filter(|s| s.tag == "loss").count(), 2);
    }

    #[test]
    fn test_mean_loss_over_batches() {
        // gt of sample i is filled with i; one sample per batch → losses 1, 2, 3
        let data   = MattingDataset::new(vec![sample(1), sample(2), sample(3)]);
        let source = MattingLoader::<TestBackend>::new(data, MattingBatcher::new(Default::default()), 1, None).unwrap();
        let mut t  = trainer(GtMeanLoss, MetricSet::new(), Box::new(source), 0);
        let summary = t.train_epoch(1).unwrap();
        assert_abs_diff_eq!(summary.loss, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_constant_metrics_average_to_constant() {
        let mut t = trainer(ConstLoss(1.0), half_metrics(3), loader(10, 2), 0);
        let summary = t.train_epoch(1).unwrap();
        assert_eq!(summary.metrics.len(), 3);
        for value in summary.metrics {
            assert_abs_diff_eq!(value, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_short_last_batch_counts_as_one() {
        // 5 samples in batches of 2 → gt means 0.5, 2.5, 4.0
        let mut t = trainer(GtMeanLoss, MetricSet::new(), loader(5, 2), 0);
        let summary = t.train_epoch(1).unwrap();
        assert_abs_diff_eq!(summary.loss, (0.5 + 2.5 + 4.0) / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_steps_are_monotonic_across_epochs() {
        let sink = RecordingSink::default();
        let mut t = trainer(ConstLoss(0.1), MetricSet::new(), loader(6, 2), 0)
            .with_writer(Box::new(sink.clone()));
        t.run_epoch(1).unwrap();
        t.run_epoch(2).unwrap();

        let steps: Vec<usize> = sink.scalars().iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_training_only_epoch_has_no_val_keys() {
        let mut t = trainer(ConstLoss(0.2), half_metrics(2), loader(4, 2), 0);
        let log = t.run_epoch(1).unwrap();
        assert!(!log.has_validation());
        let keys: Vec<String> = log.entries(&t.metric_names()).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["loss", "m0", "m1"]);
    }

    #[test]
    fn test_validation_is_merged_under_val_keys() {
        let mut t = trainer(ConstLoss(0.2), half_metrics(1), loader(4, 2), 0)
            .with_validation(valid_loader(3, 2));
        let log = t.run_epoch(1).unwrap();
        assert_abs_diff_eq!(log.loss, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(log.val_loss.unwrap(), 0.2, epsilon = 1e-6);
        assert_eq!(log.val_metrics, Some(vec![0.5]));
        assert!(t.has_validation());
    }

    #[test]
    fn test_validation_images_every_batch() {
        let sink = RecordingSink::default();
        let mut t = trainer(ConstLoss(0.2), MetricSet::new(), loader(4, 4), 0)
            .with_writer(Box::new(sink.clone()))
            .with_validation(valid_loader(5, 1));
        t.run_epoch(2).unwrap();

        let valid_inputs: Vec<usize> = sink
            .images()
            .iter()
            .filter(|e| e.mode == Mode::Valid && e.tag == "input")
            .map(|e| e.step)
            .collect();
        assert_eq!(valid_inputs, vec![5, 6, 7, 8, 9]);
        assert!(sink.images().iter().all(|e| e.mode == Mode::Valid));
    }

    #[test]
    fn test_schedule_steps_once_per_epoch() {
        let schedule = CountingSchedule::new(1e-3);
        let mut t = trainer(ConstLoss(0.2), MetricSet::new(), loader(10, 1), 0)
            .with_validation(valid_loader(4, 1))
            .with_lr_scheduler(Box::new(schedule.clone()));
        t.run_epoch(1).unwrap();
        assert_eq!(schedule.steps(), 1);
        t.run_epoch(2).unwrap();
        assert_eq!(schedule.steps(), 2);
        assert_eq!(t.schedule_position(), Some(2));
    }

    fn mean_output<B: Backend>() -> MetricSet<B> {
        MetricSet::new().with_fn("mean_out", |o: &Tensor<B, 4>, _: &Tensor<B, 4>| {
            Ok(o.clone().mean().into_scalar().elem::<f64>())
        })
    }

    #[test]
    fn test_validation_same_on_autodiff_and_inner_model() {
        let device   = Default::default();
        let model    = TinyMatting::<TestBackend>::new(&device);
        let mut sink = RecordingSink::default();

        let autodiff = validation_pass(
            &model,
            &GtMeanLoss,
            &mean_output::<TestBackend>(),
            loader(6, 2).as_mut(),
            &mut sink,
            &device,
            1,
        )
        .unwrap();
        let inner = validation_pass(
            &model.valid(),
            &GtMeanLoss,
            &mean_output::<InnerBackend>(),
            valid_loader(6, 2).as_mut(),
            &mut sink,
            &device,
            1,
        )
        .unwrap();

        // gt means per batch: 0.5, 2.5, 4.5
        assert_abs_diff_eq!(autodiff.loss, 2.5, epsilon = 1e-6);
        assert_abs_diff_eq!(autodiff.loss, inner.loss, epsilon = 1e-6);
        assert_abs_diff_eq!(autodiff.metrics[0], inner.metrics[0], epsilon = 1e-6);
    }

    #[test]
    fn test_validation_does_not_update_weights() {
        let mut t = trainer(ConstLoss(0.3), MetricSet::new(), loader(2, 2), 0)
            .with_validation(valid_loader(4, 2));
        let before = t.model().valid().weights();
        t.valid_epoch(1).unwrap();
        assert_eq!(t.model().valid().weights(), before);
    }

    #[test]
    fn test_sgd_step_moves_weights() {
        let device = Default::default();
        let model  = TinyMatting::<TestBackend>::new(&device);
        let optim  = SgdConfig::new().init::<TestBackend, TinyMatting<TestBackend>>();
        let mut t  = MattingTrainer::new(
            model,
            optim,
            OutputMeanLoss,
            MetricSet::new(),
            loader(4, 2),
            TrainerContext { device, verbosity: 0, lr: 0.5 },
        );
        let before = t.model().valid().weights();
        t.train_epoch(1).unwrap();
        assert_ne!(t.model().valid().weights(), before);
    }

    #[test]
    fn test_non_finite_loss_is_an_error() {
        let mut t = trainer(ConstLoss(f32::NAN), MetricSet::new(), loader(4, 2), 0);
        let err = t.train_epoch(1).unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn test_empty_source_is_an_error() {
        let mut t = trainer(ConstLoss(0.1), MetricSet::new(), loader(0, 2), 0);
        assert!(t.train_epoch(1).is_err());
    }

    #[test]
    fn test_missing_validation_source_is_an_error() {
        let mut t = trainer(ConstLoss(0.1), MetricSet::new(), loader(2, 2), 0);
        assert!(t.valid_epoch(1).is_err());
    }

    #[test]
    fn test_failing_metric_aborts_epoch() {
        let metrics = MetricSet::new().with_fn("broken", |_, _| anyhow::bail!("metric exploded"));
        let mut t = trainer(ConstLoss(0.1), metrics, loader(2, 2), 0);
        let err = t.run_epoch(1).unwrap_err();
        assert!(err.to_string().contains("metric exploded"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_constant_loss_averages_to_itself(
            c in 0.0f32..10.0,
            n in 1usize..6,
            batch_size in 1usize..4,
        ) {
            let mut t = trainer(ConstLoss(c), MetricSet::new(), loader(n, batch_size), 0);
            let summary = t.train_epoch(1).unwrap();
            prop_assert!((summary.loss - c as f64).abs() < 1e-5);
        }

        #[test]
        fn prop_metric_vector_follows_metric_set(k in 0usize..5) {
            let mut t = trainer(ConstLoss(0.1), half_metrics(k), loader(3, 2), 0);
            let log = t.run_epoch(1).unwrap();
            prop_assert_eq!(log.metrics.len(), k);
            prop_assert_eq!(t.metric_names(), (0..k).map(|i| format!("m{i}")).collect::<Vec<_>>());
        }
    }
}

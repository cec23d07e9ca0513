// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Wires a training run together from a TrainerConfig:
//
//   Step 1: Validate the config
//   Step 2: Split the dataset                (Layer 4 - data)
//   Step 3: Build both Burn data loaders     (Layer 4 - data)
//   Step 4: Build Adam and the lr schedule   (Layer 5 - ml)
//   Step 5: Choose the diagnostics writer    (Layer 6 - infra)
//   Step 6: Build the trainer                (Layer 5 - ml)
//   Step 7: Build the supervisor, resume     (Layer 2)
//   Step 8: Run the epoch loop
//
// The caller brings the network, the loss, the metrics and the
// decoded dataset; none of them are built here.
//
// Run artefacts land in <save_dir>/<name>/.
//
// Reference: Burn Book §5 (Training)

use std::path::PathBuf;

use anyhow::Result;
use burn::{data::dataset::Dataset, module::AutodiffModule, tensor::backend::AutodiffBackend};
use tracing::info;

use crate::application::config::TrainerConfig;
use crate::application::supervisor::{Supervisor, TrainingReport};
use crate::data::batch::BatchSource;
use crate::data::dataset::MattingSample;
use crate::data::loader::train_valid_loaders;
use crate::infra::writer::RunWriter;
use crate::ml::metrics::MetricSet;
use crate::ml::model::{MattingLoss, MattingModel};
use crate::ml::trainer::{MattingTrainer, TrainerContext};

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainerConfig,
    resume: Option<String>,
}

impl TrainUseCase {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config, resume: None }
    }

    /// Resume from checkpoint `tag` ("latest", "best", "epoch10", ...).
    pub fn with_resume(mut self, tag: impl Into<String>) -> Self {
        self.resume = Some(tag.into());
        self
    }

    pub fn run_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.trainer.save_dir).join(&self.config.name)
    }

    /// Execute the full training run end to end.
    pub fn execute<B, M, L, D>(
        &self,
        model:   M,
        loss:    L,
        metrics: MetricSet<B::InnerBackend>,
        dataset: D,
        device:  B::Device,
    ) -> Result<TrainingReport>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + MattingModel<B>,
        M::InnerModule: MattingModel<B::InnerBackend>,
        L: MattingLoss<B> + MattingLoss<B::InnerBackend>,
        D: Dataset<MattingSample> + 'static,
    {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;
        let run_dir = self.run_dir();

        // ── Step 2-3: Training loader, validation split (inner backend) ───────
        let loader_cfg = &cfg.data_loader;
        let (train_loader, valid_loader) = train_valid_loaders::<B, B::InnerBackend, D>(
            dataset,
            loader_cfg.batch_size,
            loader_cfg.shuffle,
            loader_cfg.validation_split,
            loader_cfg.seed,
            device.clone(),
            device.clone(),
        )?;
        info!(
            "Data: {} training samples in {} batches, {} validation samples",
            train_loader.n_samples(),
            train_loader.len(),
            valid_loader.as_ref().map_or(0, |v| v.n_samples()),
        );

        // ── Step 4: Optimiser and schedule ────────────────────────────────────
        let optim = cfg.optimizer.adam().init::<B, M>();
        let ctx   = TrainerContext {
            device,
            verbosity: cfg.trainer.verbosity,
            lr:        cfg.optimizer.lr,
        };
        let mut trainer = MattingTrainer::new(model, optim, loss, metrics, Box::new(train_loader), ctx);

        if let Some(valid_loader) = valid_loader {
            trainer = trainer.with_validation(Box::new(valid_loader));
        }
        if let Some(schedule) = &cfg.lr_scheduler {
            trainer = trainer.with_lr_scheduler(schedule.init(cfg.optimizer.lr));
        }

        // ── Step 5: Diagnostics writer ────────────────────────────────────────
        if cfg.trainer.tensorboard {
            trainer = trainer.with_writer(Box::new(RunWriter::new(run_dir.join("log"))?));
        }

        // ── Step 6-7: Supervisor, optional resume ─────────────────────────────
        let mut supervisor = Supervisor::new(cfg.clone(), &run_dir)?;
        if let Some(tag) = &self.resume {
            trainer = supervisor.resume(trainer, tag)?;
        }

        // ── Step 8: Epoch loop ────────────────────────────────────────────────
        info!("Training '{}' into '{}'", cfg.name, run_dir.display());
        let report = supervisor.train(&mut trainer)?;
        info!(
            "Training finished after epoch {}{}",
            report.last_epoch,
            if report.stopped_early { " (early stop)" } else { "" },
        );
        Ok(report)
    }
}

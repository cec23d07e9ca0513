// ============================================================
// Layer 4 — Matting Loader
// ============================================================
// A BatchSource backed by Burn's DataLoader:
//
//   DataLoaderBuilder::new(MattingBatcher)
//       .batch_size(n)
//       .shuffle(seed)        ← only when shuffling is on
//       .build(dataset)
//
// Every call to iter() starts a new pass; a shuffling loader
// draws a fresh order each time. The last batch of a pass may
// be short and len() counts it.
//
// train_valid_loaders() splits one dataset into a training
// loader on the autodiff backend and a validation loader on
// the inner backend. The validation loader never shuffles and
// drops trimap/gradient.
//
// Reference: Burn Book §4 (DataLoader)

use std::sync::Arc;

use anyhow::{ensure, Result};
use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    prelude::*,
};
use tracing::warn;

use crate::data::batch::{BatchOutcome, BatchSource, MattingBatch};
use crate::data::batcher::MattingBatcher;
use crate::data::dataset::MattingSample;
use crate::data::splitter::split_dataset;

pub struct MattingLoader<B: Backend> {
    loader:     Arc<dyn DataLoader<BatchOutcome<B>>>,
    batch_size: usize,
}

impl<B: Backend> MattingLoader<B> {
    /// Loader over every sample of `dataset`. With `shuffle` set,
    /// each pass visits the samples in a new order seeded from it.
    pub fn new<D>(
        dataset:    D,
        batcher:    MattingBatcher<B>,
        batch_size: usize,
        shuffle:    Option<u64>,
    ) -> Result<Self>
    where
        D: Dataset<MattingSample> + 'static,
    {
        ensure!(batch_size > 0, "batch_size must be at least 1");
        let mut builder = DataLoaderBuilder::new(batcher).batch_size(batch_size);
        if let Some(seed) = shuffle {
            builder = builder.shuffle(seed);
        }
        Ok(Self { loader: builder.build(dataset), batch_size })
    }
}

impl<B: Backend> BatchSource<B> for MattingLoader<B> {
    fn len(&self) -> usize {
        self.loader.num_items().div_ceil(self.batch_size)
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn n_samples(&self) -> usize {
        self.loader.num_items()
    }

    fn iter(&mut self) -> Box<dyn Iterator<Item = Result<MattingBatch<B>>> + '_> {
        Box::new(self.loader.iter().map(|outcome| outcome.map_err(anyhow::Error::from)))
    }
}

// ─── Train / Validation Loaders ───────────────────────────────────────────────
/// Training loader on `device` plus, when `validation_split`
/// selects at least one sample, a validation loader on
/// `valid_device`. The split is drawn once from `seed`.
pub fn train_valid_loaders<B, VB, D>(
    dataset:          D,
    batch_size:       usize,
    shuffle:          bool,
    validation_split: f64,
    seed:             u64,
    device:           B::Device,
    valid_device:     VB::Device,
) -> Result<(MattingLoader<B>, Option<MattingLoader<VB>>)>
where
    B: Backend,
    VB: Backend,
    D: Dataset<MattingSample> + 'static,
{
    ensure!(
        (0.0..1.0).contains(&validation_split),
        "validation_split must be in [0, 1), got {validation_split}"
    );
    let shuffle = shuffle.then_some(seed);
    let train_batcher = MattingBatcher::<B>::new(device);

    if validation_split == 0.0 {
        let train = MattingLoader::new(dataset, train_batcher, batch_size, shuffle)?;
        return Ok((train, None));
    }

    let n = dataset.len();
    let (train_set, valid_set) = split_dataset(dataset, validation_split, seed);
    let train = MattingLoader::new(train_set, train_batcher, batch_size, shuffle)?;

    if valid_set.is_empty() {
        warn!(
            "validation_split={} selects no samples out of {}; validation disabled",
            validation_split, n
        );
        return Ok((train, None));
    }

    let valid_batcher = MattingBatcher::<VB>::without_auxiliary(valid_device);
    let valid = MattingLoader::new(valid_set, valid_batcher, batch_size, None)?;
    Ok((train, Some(valid)))
}

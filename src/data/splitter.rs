// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Carves a validation share off a dataset with Burn's dataset
// transforms:
//
//   ShuffledDataset::with_seed   → one fixed permutation
//   PartialDataset [0, n_valid)  → validation samples
//   PartialDataset [n_valid, n)  → training samples
//
// Both halves read the same shuffled dataset through an Arc,
// so no sample is copied. A given seed always gives the same
// split.
//
// Reference: Burn Book §4 (Dataset transforms)

use std::sync::Arc;

use burn::data::dataset::{
    transform::{PartialDataset, ShuffledDataset},
    Dataset,
};

/// A type-erased, shareable dataset.
pub type SharedDataset<I> = Arc<dyn Dataset<I>>;

/// Number of validation samples for `n` samples:
/// `floor(n * valid_fraction)`, never more than `n`.
pub fn validation_count(n: usize, valid_fraction: f64) -> usize {
    (((n as f64) * valid_fraction).floor() as usize).min(n)
}

/// Shuffle `dataset` with `seed` and split it into
/// (train, validation).
pub fn split_dataset<D, I>(
    dataset:        D,
    valid_fraction: f64,
    seed:           u64,
) -> (SharedDataset<I>, SharedDataset<I>)
where
    D: Dataset<I> + 'static,
    I: Clone + Send + Sync + 'static,
{
    let n       = dataset.len();
    let n_valid = validation_count(n, valid_fraction);

    let shuffled = Arc::new(ShuffledDataset::<D, I>::with_seed(dataset, seed));
    let valid: PartialDataset<_, I> = PartialDataset::new(Arc::clone(&shuffled), 0, n_valid);
    let train: PartialDataset<_, I> = PartialDataset::new(shuffled, n_valid, n);

    tracing::debug!("Dataset split: {} training, {} validation", train.len(), valid.len());

    (Arc::new(train), Arc::new(valid))
}

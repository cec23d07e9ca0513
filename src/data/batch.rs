// ============================================================
// Layer 4 — MattingBatch and BatchSource
// ============================================================
// A batch is the multi-scale image pyramid plus supervision:
//
//   image_scale1  [N, 3, H,   W  ]   full resolution input
//   image_scale2  [N, 3, H/2, W/2]   (any size the model accepts)
//   image_scale3  [N, 3, H/4, W/4]
//   gt            [N, 1, H,   W  ]   ground-truth alpha
//   trimap        [N, 1, H,   W  ]   training batches only
//   gradient      [N, 1, H,   W  ]   training batches only
//
// All tensors share the leading batch dimension N.
//
// Burn's DataLoader hands batches over by value, so a batch that
// cannot be stacked travels as BatchOutcome::Err and is turned
// into an anyhow error when the pass reads it.

use std::fmt;

use anyhow::Result;
use burn::prelude::*;

/// One batch of matting inputs and supervision.
#[derive(Debug, Clone)]
pub struct MattingBatch<B: Backend> {
    pub image_scale1: Tensor<B, 4>,
    pub image_scale2: Tensor<B, 4>,
    pub image_scale3: Tensor<B, 4>,
    pub gt:           Tensor<B, 4>,
    pub trimap:       Option<Tensor<B, 4>>,
    pub gradient:     Option<Tensor<B, 4>>,
}

impl<B: Backend> MattingBatch<B> {
    /// Number of samples in the batch (leading dimension).
    pub fn batch_size(&self) -> usize {
        self.image_scale1.dims()[0]
    }

    /// Move every tensor of the batch to `device`.
    pub fn to_device(self, device: &B::Device) -> Self {
        Self {
            image_scale1: self.image_scale1.to_device(device),
            image_scale2: self.image_scale2.to_device(device),
            image_scale3: self.image_scale3.to_device(device),
            gt:           self.gt.to_device(device),
            trimap:       self.trimap.map(|t| t.to_device(device)),
            gradient:     self.gradient.map(|t| t.to_device(device)),
        }
    }
}

// ─── BatchError ───────────────────────────────────────────────────────────────
/// Why a group of samples could not be stacked into a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError(pub String);

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BatchError {}

/// What the batcher yields for each group of samples.
pub type BatchOutcome<B> = Result<MattingBatch<B>, BatchError>;

// ─── BatchSource ──────────────────────────────────────────────────────────────
/// A finite, restartable sequence of batches.
///
/// Implementations:
///   - MattingLoader → wraps a Burn DataLoader over MattingSample
pub trait BatchSource<B: Backend> {
    /// Number of batches in one pass.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nominal number of samples per batch.
    fn batch_size(&self) -> usize;

    /// Total number of samples in one pass.
    fn n_samples(&self) -> usize;

    /// Start a new pass from the first batch.
    fn iter(&mut self) -> Box<dyn Iterator<Item = Result<MattingBatch<B>>> + '_>;
}

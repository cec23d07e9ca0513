// ============================================================
// Layer 4 — Matting Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<MattingSample>
// into a MattingBatch on a device. The DataLoader calls .batch()
// with each group of batch_size samples.
//
// How batching works here:
//   Input:  N samples, each plane of shape (C, H, W)
//   Output: one tensor per field, shape [N, C, H, W]
//
//   Each field is flattened sample after sample and reshaped:
//   [s1_c1_..., s1_cC_..., s2_..., ..., sN_...] → [N, C, H, W]
//
// Every sample of a batch must carry planes of identical shape;
// a mismatch is reported as an error, not padded.
//
// Reference: Burn Book §4 (Batcher)

use anyhow::{bail, ensure, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::batch::{BatchError, BatchOutcome, MattingBatch};
use crate::data::dataset::{MattingSample, SampleImage};

/// Holds the target device and whether trimap/gradient planes
/// are stacked (training) or dropped (validation).
#[derive(Clone, Debug)]
pub struct MattingBatcher<B: Backend> {
    pub device:         B::Device,
    pub with_auxiliary: bool,
}

impl<B: Backend> MattingBatcher<B> {
    /// Batcher for training data: trimap and gradient are kept.
    pub fn new(device: B::Device) -> Self {
        Self { device, with_auxiliary: true }
    }

    /// Batcher for validation data: trimap and gradient are dropped.
    pub fn without_auxiliary(device: B::Device) -> Self {
        Self { device, with_auxiliary: false }
    }

    /// Stack `items`, or explain why they cannot share a batch.
    pub fn try_batch(&self, items: &[MattingSample]) -> Result<MattingBatch<B>> {
        ensure!(!items.is_empty(), "cannot build a batch from zero samples");

        let image_scale1 = self.stack(items, "image-scale1", |s| Some(&s.image_scale1))?;
        let image_scale2 = self.stack(items, "image-scale2", |s| Some(&s.image_scale2))?;
        let image_scale3 = self.stack(items, "image-scale3", |s| Some(&s.image_scale3))?;
        let gt           = self.stack(items, "gt", |s| Some(&s.gt))?;

        let (trimap, gradient) = if self.with_auxiliary {
            (
                self.stack_optional(items, "trimap", |s| s.trimap.as_ref())?,
                self.stack_optional(items, "gradient", |s| s.gradient.as_ref())?,
            )
        } else {
            (None, None)
        };

        Ok(MattingBatch { image_scale1, image_scale2, image_scale3, gt, trimap, gradient })
    }

    /// Stack a field that may be absent. Either every sample has it
    /// or none does.
    fn stack_optional<F>(&self, items: &[MattingSample], name: &str, pick: F) -> Result<Option<Tensor<B, 4>>>
    where
        F: Fn(&MattingSample) -> Option<&SampleImage>,
    {
        let present = items.iter().filter(|s| pick(s).is_some()).count();
        match present {
            0 => Ok(None),
            n if n == items.len() => Ok(Some(self.stack(items, name, pick)?)),
            n => bail!("'{name}' present in {n} of {} samples", items.len()),
        }
    }

    fn stack<F>(&self, items: &[MattingSample], name: &str, pick: F) -> Result<Tensor<B, 4>>
    where
        F: Fn(&MattingSample) -> Option<&SampleImage>,
    {
        let mut shape: Option<[usize; 3]> = None;
        let mut flat: Vec<f32> = Vec::new();

        for (i, sample) in items.iter().enumerate() {
            let Some(img) = pick(sample) else {
                bail!("sample {i} has no '{name}' plane");
            };
            match shape {
                None => {
                    shape = Some(img.shape());
                    flat.reserve(items.len() * img.data.len());
                }
                Some(expected) => ensure!(
                    expected == img.shape(),
                    "'{name}' of sample {i} has shape {:?}, expected {:?}",
                    img.shape(), expected
                ),
            }
            flat.extend_from_slice(&img.data);
        }

        let [c, h, w] = shape.unwrap_or([0, 0, 0]);
        let data = TensorData::new(flat, [items.len(), c, h, w]);
        Ok(Tensor::<B, 4>::from_data(data, &self.device))
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<MattingSample, BatchOutcome<B>> for MattingBatcher<B> {
    fn batch(&self, items: Vec<MattingSample>) -> BatchOutcome<B> {
        self.try_batch(&items).map_err(|e| BatchError(format!("{e:#}")))
    }
}

// ============================================================
// Layer 4 — Matting Samples and Dataset
// ============================================================
// A sample is already decoded into f32 planes in host memory;
// reading image files and augmentation happen before this point.
//
//   image_scale1..3  (3, H_k, W_k)  input pyramid
//   gt               (1, H, W)      alpha in [0, 1]
//   trimap           (1, H, W)      optional
//   gradient         (1, H, W)      optional
//
// MattingDataset implements Burn's Dataset trait so loaders can
// call get(index) and len() on it.

use anyhow::{ensure, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One decoded image plane stack, channel-major (C, H, W).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleImage {
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,
    pub data:     Vec<f32>,
}

impl SampleImage {
    pub fn new(channels: usize, height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        ensure!(
            data.len() == channels * height * width,
            "image data has {} values, expected {}x{}x{}",
            data.len(), channels, height, width
        );
        Ok(Self { channels, height, width, data })
    }

    pub fn filled(channels: usize, height: usize, width: usize, value: f32) -> Self {
        Self { channels, height, width, data: vec![value; channels * height * width] }
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }
}

/// One training example: the image pyramid plus supervision.
/// Trimap and gradient are optional so the same type serves
/// validation data, where they are not consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MattingSample {
    pub image_scale1: SampleImage,
    pub image_scale2: SampleImage,
    pub image_scale3: SampleImage,
    pub gt:           SampleImage,
    pub trimap:       Option<SampleImage>,
    pub gradient:     Option<SampleImage>,
}

pub struct MattingDataset {
    samples: Vec<MattingSample>,
}

impl MattingDataset {
    pub fn new(samples: Vec<MattingSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<MattingSample> for MattingDataset {
    fn get(&self, index: usize) -> Option<MattingSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

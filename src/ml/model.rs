// ============================================================
// Layer 5 — Model and Loss Contracts
// ============================================================
// The trainer never looks inside the network or the loss. It
// only needs:
//
//   model(image_scale1, image_scale2, image_scale3) → alpha
//   loss(alpha, gt)                                 → scalar
//
// Both traits are generic over the backend. A network built
// with #[derive(Module)] and a generic impl of MattingModel<B>
// serves the autodiff backend during training and, through
// AutodiffModule::valid(), the inner backend during validation.

use anyhow::Result;
use burn::prelude::*;

/// A matting network over a three-level image pyramid.
pub trait MattingModel<B: Backend> {
    /// Predict alpha with the same spatial shape as the ground truth.
    fn forward(
        &self,
        image_scale1: Tensor<B, 4>,
        image_scale2: Tensor<B, 4>,
        image_scale3: Tensor<B, 4>,
    ) -> Tensor<B, 4>;
}

/// A scalar training objective comparing prediction and ground truth.
pub trait MattingLoss<B: Backend> {
    /// Returns a one-element tensor. Errors are reserved for inputs
    /// the loss cannot score (e.g. mismatched shapes).
    fn forward(&self, output: &Tensor<B, 4>, gt: &Tensor<B, 4>) -> Result<Tensor<B, 1>>;
}

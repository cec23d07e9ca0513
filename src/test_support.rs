// Shared doubles for unit tests: a one-layer network, toy losses,
// a recording diagnostics sink, a counting schedule and a small
// synthetic dataset.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use anyhow::Result;
use burn::{
    backend::{Autodiff, NdArray},
    nn::conv::{Conv2d, Conv2dConfig},
    prelude::*,
    tensor::activation::sigmoid,
};

use crate::data::dataset::{MattingDataset, MattingSample, SampleImage};
use crate::domain::grid::ImageGrid;
use crate::domain::traits::{DiagnosticsSink, LrSchedule, Mode};
use crate::ml::model::{MattingLoss, MattingModel};

pub type InnerBackend = NdArray;
pub type TestBackend  = Autodiff<InnerBackend>;

// ─── Network ──────────────────────────────────────────────────────────────────
/// 1×1 convolution from RGB to one channel, then a sigmoid.
/// Only the full-resolution scale is used.
#[derive(Module, Debug)]
pub struct TinyMatting<B: Backend> {
    conv: Conv2d<B>,
}

impl<B: Backend> TinyMatting<B> {
    pub fn new(device: &B::Device) -> Self {
        Self { conv: Conv2dConfig::new([3, 1], [1, 1]).init(device) }
    }

    /// Flattened weights followed by the bias.
    pub fn weights(&self) -> Vec<f32> {
        let mut out = self.conv.weight.val().into_data().to_vec::<f32>().unwrap();
        if let Some(bias) = &self.conv.bias {
            out.extend(bias.val().into_data().to_vec::<f32>().unwrap());
        }
        out
    }
}

impl<B: Backend> MattingModel<B> for TinyMatting<B> {
    fn forward(
        &self,
        image_scale1: Tensor<B, 4>,
        _image_scale2: Tensor<B, 4>,
        _image_scale3: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        sigmoid(self.conv.forward(image_scale1))
    }
}

// ─── Losses ───────────────────────────────────────────────────────────────────
/// Mean of the ground truth; the prediction only joins the graph.
#[derive(Debug, Clone, Copy)]
pub struct GtMeanLoss;

impl<B: Backend> MattingLoss<B> for GtMeanLoss {
    fn forward(&self, output: &Tensor<B, 4>, gt: &Tensor<B, 4>) -> Result<Tensor<B, 1>> {
        Ok(gt.clone().mean() + output.clone().mean().mul_scalar(0.0))
    }
}

/// Always `self.0`.
#[derive(Debug, Clone, Copy)]
pub struct ConstLoss(pub f32);

impl<B: Backend> MattingLoss<B> for ConstLoss {
    fn forward(&self, output: &Tensor<B, 4>, _gt: &Tensor<B, 4>) -> Result<Tensor<B, 1>> {
        Ok(output.clone().mean().mul_scalar(0.0).add_scalar(self.0))
    }
}

/// Mean prediction, so every step moves the weights.
#[derive(Debug, Clone, Copy)]
pub struct OutputMeanLoss;

impl<B: Backend> MattingLoss<B> for OutputMeanLoss {
    fn forward(&self, output: &Tensor<B, 4>, _gt: &Tensor<B, 4>) -> Result<Tensor<B, 1>> {
        Ok(output.clone().mean())
    }
}

// ─── RecordingSink ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarEvent {
    pub mode:  Mode,
    pub step:  usize,
    pub tag:   String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageEvent {
    pub mode:   Mode,
    pub step:   usize,
    pub tag:    String,
    pub height: usize,
    pub width:  usize,
}

#[derive(Debug)]
struct SinkState {
    mode:    Mode,
    step:    usize,
    scalars: Vec<ScalarEvent>,
    images:  Vec<ImageEvent>,
}

/// Clones share one event log, so a test can keep a handle after
/// boxing the sink into a trainer.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    state: Rc<RefCell<SinkState>>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        let state = SinkState { mode: Mode::Train, step: 0, scalars: Vec::new(), images: Vec::new() };
        Self { state: Rc::new(RefCell::new(state)) }
    }
}

impl RecordingSink {
    pub fn scalars(&self) -> Vec<ScalarEvent> {
        self.state.borrow().scalars.clone()
    }

    pub fn images(&self) -> Vec<ImageEvent> {
        self.state.borrow().images.clone()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn set_step(&mut self, step: usize, mode: Mode) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.step = step;
        state.mode = mode;
        Ok(())
    }

    fn add_scalar(&mut self, tag: &str, value: f64) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let event = ScalarEvent { mode: state.mode, step: state.step, tag: tag.to_string(), value };
        state.scalars.push(event);
        Ok(())
    }

    fn add_image(&mut self, tag: &str, image: &ImageGrid) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let event = ImageEvent {
            mode:   state.mode,
            step:   state.step,
            tag:    tag.to_string(),
            height: image.height,
            width:  image.width,
        };
        state.images.push(event);
        Ok(())
    }
}

// ─── CountingSchedule ─────────────────────────────────────────────────────────
/// Constant learning rate that counts step() calls across clones.
#[derive(Debug, Clone)]
pub struct CountingSchedule {
    lr:    f64,
    steps: Rc<Cell<usize>>,
}

impl CountingSchedule {
    pub fn new(lr: f64) -> Self {
        Self { lr, steps: Rc::new(Cell::new(0)) }
    }

    pub fn steps(&self) -> usize {
        self.steps.get()
    }
}

impl LrSchedule for CountingSchedule {
    fn lr(&self) -> f64 {
        self.lr
    }

    fn step(&mut self) {
        self.steps.set(self.steps.get() + 1);
    }

    fn last_epoch(&self) -> usize {
        self.steps.get()
    }

    fn set_last_epoch(&mut self, epoch: usize) {
        self.steps.set(epoch);
    }
}

// ─── Data ─────────────────────────────────────────────────────────────────────
/// Sample `i` has every plane filled with `i`, except trimap (0.5)
/// and gradient (0.0). Full resolution is 2×2.
pub fn sample(i: usize) -> MattingSample {
    let v = i as f32;
    MattingSample {
        image_scale1: SampleImage::filled(3, 2, 2, v),
        image_scale2: SampleImage::filled(3, 1, 1, v),
        image_scale3: SampleImage::filled(3, 1, 1, v),
        gt:           SampleImage::filled(1, 2, 2, v),
        trimap:       Some(SampleImage::filled(1, 2, 2, 0.5)),
        gradient:     Some(SampleImage::filled(1, 2, 2, 0.0)),
    }
}

pub fn dataset(n: usize) -> MattingDataset {
    MattingDataset::new((0..n).map(sample).collect())
}

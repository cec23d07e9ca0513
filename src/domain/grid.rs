// ============================================================
// Layer 3 — ImageGrid
// ============================================================
// A picture that has already left the compute device.
// Stored channel-major (C, H, W) as f32 in [0, 1] when it was
// built with normalisation. Sinks decide how to persist it.

/// Host-side image, channel-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGrid {
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,
    pub data:     Vec<f32>,
}

impl ImageGrid {
    /// Create a grid filled with `value`.
    pub fn filled(channels: usize, height: usize, width: usize, value: f32) -> Self {
        Self {
            channels,
            height,
            width,
            data: vec![value; channels * height * width],
        }
    }

    pub fn pixel(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[(c * self.height + y) * self.width + x]
    }

    pub fn set_pixel(&mut self, c: usize, y: usize, x: usize, value: f32) {
        let idx = (c * self.height + y) * self.width + x;
        self.data[idx] = value;
    }

    /// Interleaved 8-bit RGB (H, W, 3). Grey grids are replicated
    /// into all three channels; values are clamped to [0, 1].
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.height * self.width * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                for c in 0..3 {
                    let src = if self.channels >= 3 { c } else { 0 };
                    let v   = self.pixel(src, y, x).clamp(0.0, 1.0);
                    out.push((v * 255.0).round() as u8);
                }
            }
        }
        out
    }
}

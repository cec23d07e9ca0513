// ============================================================
// Layer 5 — Image Grids
// ============================================================
// Lays a batch [N, C, H, W] out as one picture for diagnostics:
//
//   ┌──┬──┬──┬──┬──┬──┬──┬──┐
//   │s0│s1│s2│s3│s4│s5│s6│s7│   nrow samples per row,
//   ├──┼──┼──┼──┴──┴──┴──┴──┘   2 px of zero padding around
//   │s8│s9│  │                   every tile
//   └──┴──┴──┘
//
// With normalize = true the whole batch is shifted and scaled
// so its minimum maps to 0 and its maximum to 1. Single-channel
// maps (alpha, trimap) are replicated to three channels.
// A batch of one sample is returned as-is, without padding.

use anyhow::{anyhow, ensure, Result};
use burn::prelude::*;

use crate::domain::grid::ImageGrid;

const PADDING: usize = 2;

pub fn make_grid<B: Backend>(images: Tensor<B, 4>, nrow: usize, normalize: bool) -> Result<ImageGrid> {
    let [n, c, h, w] = images.dims();
    ensure!(n > 0, "cannot build an image grid from an empty batch");
    ensure!(nrow > 0, "nrow must be at least 1");

    let mut values = images
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("cannot read image tensor: {e:?}"))?;

    if normalize {
        normalize_range(&mut values);
    }

    let out_c     = if c == 1 { 3 } else { c };
    let source_ch = |ch: usize| if c == 1 { 0 } else { ch };
    let value_at  = |k: usize, ch: usize, y: usize, x: usize| values[((k * c + ch) * h + y) * w + x];

    if n == 1 {
        let mut grid = ImageGrid::filled(out_c, h, w, 0.0);
        for ch in 0..out_c {
            for y in 0..h {
                for x in 0..w {
                    grid.set_pixel(ch, y, x, value_at(0, source_ch(ch), y, x));
                }
            }
        }
        return Ok(grid);
    }

    let xmaps  = nrow.min(n);
    let ymaps  = n.div_ceil(xmaps);
    let cell_h = h + PADDING;
    let cell_w = w + PADDING;
    let mut grid = ImageGrid::filled(out_c, ymaps * cell_h + PADDING, xmaps * cell_w + PADDING, 0.0);

    for k in 0..n {
        let top  = (k / xmaps) * cell_h + PADDING;
        let left = (k % xmaps) * cell_w + PADDING;
        for ch in 0..out_c {
            for y in 0..h {
                for x in 0..w {
                    grid.set_pixel(ch, top + y, left + x, value_at(k, source_ch(ch), y, x));
                }
            }
        }
    }
    Ok(grid)
}

fn normalize_range(values: &mut [f32]) {
    let lo = values.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = (hi - lo).max(1e-5);
    for v in values.iter_mut() {
        *v = (v.clamp(lo, hi) - lo) / span;
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InnerBackend;
    use approx::assert_abs_diff_eq;

    fn batch(n: usize, c: usize, h: usize, w: usize) -> Tensor<InnerBackend, 4> {
        let data: Vec<f32> = (0..n * c * h * w).map(|v| v as f32).collect();
        Tensor::from_data(TensorData::new(data, [n, c, h, w]), &Default::default())
    }

    #[test]
    fn test_single_image_has_no_padding() {
        let grid = make_grid(batch(1, 3, 4, 5), 8, false).unwrap();
        assert_eq!((grid.channels, grid.height, grid.width), (3, 4, 5));
        assert_eq!(grid.pixel(2, 3, 4), 59.0);
    }

    #[test]
    fn test_grid_dimensions() {
        // 10 samples, 8 per row → 2 rows
        let grid = make_grid(batch(10, 1, 4, 4), 8, true).unwrap();
        assert_eq!(grid.channels, 3);
        assert_eq!(grid.height, 2 * (4 + 2) + 2);
        assert_eq!(grid.width, 8 * (4 + 2) + 2);
    }

    #[test]
    fn test_few_samples_use_fewer_columns() {
        let grid = make_grid(batch(3, 3, 2, 2), 8, false).unwrap();
        assert_eq!(grid.width, 3 * (2 + 2) + 2);
        assert_eq!(grid.height, 2 + 2 + 2);
    }

    #[test]
    fn test_tiles_are_placed_row_major() {
        let grid = make_grid(batch(3, 1, 2, 2), 2, false).unwrap();
        // sample 1, pixel (0, 0) → row 0, column 1
        assert_eq!(grid.pixel(0, 2, 2 + 4), 4.0);
        // sample 2, pixel (1, 1) → row 1, column 0
        assert_eq!(grid.pixel(0, 2 + 4 + 1, 2 + 1), 11.0);
        // padding stays zero
        assert_eq!(grid.pixel(0, 0, 0), 0.0);
    }

    #[test]
    fn test_normalize_maps_to_unit_range() {
        let grid = make_grid(batch(1, 1, 2, 2), 8, true).unwrap();
        assert_abs_diff_eq!(grid.pixel(0, 0, 0), 0.0);
        assert_abs_diff_eq!(grid.pixel(0, 1, 1), 1.0);
        assert_abs_diff_eq!(grid.pixel(1, 0, 1), 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_constant_batch_normalizes_to_zero() {
        let t = Tensor::<InnerBackend, 4>::ones([2, 1, 2, 2], &Default::default());
        let grid = make_grid(t, 8, true).unwrap();
        assert!(grid.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let t = Tensor::<InnerBackend, 4>::zeros([0, 1, 2, 2], &Default::default());
        assert!(make_grid(t, 8, true).is_err());
    }
}

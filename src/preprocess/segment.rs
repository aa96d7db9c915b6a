//! Foreground/background segmentation at block resolution.

use crate::image::{Grid, Rect};
use crate::preprocess::orientation::DirectionMap;
use crate::util::{RidgeMatchError, RidgeMatchResult};

/// Block-resolution foreground mask with per-block contrast.
#[derive(Clone, Debug)]
pub struct SegmentationMask {
    blocks: Grid<bool>,
    contrast: Grid<f32>,
    block_size: usize,
    width: usize,
    height: usize,
}

impl SegmentationMask {
    /// Creates a mask marking every block as foreground with zero contrast.
    pub fn all_foreground(width: usize, height: usize, block_size: usize) -> RidgeMatchResult<Self> {
        if block_size == 0 {
            return Err(RidgeMatchError::InvalidConfig {
                reason: "block_size must be positive",
            });
        }
        let blocks_x = width.div_ceil(block_size);
        let blocks_y = height.div_ceil(block_size);
        Ok(Self {
            blocks: Grid::new(blocks_x, blocks_y, true)?,
            contrast: Grid::new(blocks_x, blocks_y, 0.0)?,
            block_size,
            width,
            height,
        })
    }

    /// Wraps a block grid covering a `width` x `height` image.
    pub fn from_blocks(
        blocks: Grid<bool>,
        width: usize,
        height: usize,
        block_size: usize,
    ) -> RidgeMatchResult<Self> {
        let mut mask = Self::all_foreground(width, height, block_size)?;
        if blocks.width() != mask.blocks.width() || blocks.height() != mask.blocks.height() {
            return Err(RidgeMatchError::InvalidDimensions {
                width: blocks.width(),
                height: blocks.height(),
            });
        }
        mask.blocks = blocks;
        Ok(mask)
    }

    /// Returns the block edge length in pixels.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the per-block foreground flags.
    pub fn blocks(&self) -> &Grid<bool> {
        &self.blocks
    }

    /// Returns the number of foreground blocks.
    pub fn foreground_blocks(&self) -> usize {
        self.blocks.count_set()
    }

    /// Returns true when pixel `(x, y)` lies in a foreground block.
    pub fn is_foreground(&self, x: usize, y: usize) -> bool {
        x < self.width
            && y < self.height
            && self
                .blocks
                .get(x / self.block_size, y / self.block_size)
                .unwrap_or(false)
    }

    /// Returns true when every pixel of the Chebyshev square of `radius`
    /// around `(x, y)` is inside the image and in a foreground block.
    pub fn square_is_foreground(&self, x: usize, y: usize, radius: usize) -> bool {
        let (Some(x0), Some(y0)) = (x.checked_sub(radius), y.checked_sub(radius)) else {
            return false;
        };
        let x1 = x + radius;
        let y1 = y + radius;
        if x1 >= self.width || y1 >= self.height {
            return false;
        }
        let bs = self.block_size;
        (y0 / bs..=y1 / bs).all(|by| {
            (x0 / bs..=x1 / bs).all(|bx| self.blocks.get(bx, by).unwrap_or(false))
        })
    }

    /// Smallest pixel rectangle covering every foreground block, clipped to
    /// the image. `None` when no block is foreground.
    ///
    /// Crop a capture to this rectangle (see [`crate::RidgeImage::crop`]) to
    /// drop the blank border around the finger.
    pub fn foreground_bounds(&self) -> Option<Rect> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (bx, by, foreground) in self.blocks.cells() {
            if !foreground {
                continue;
            }
            let b = bounds.get_or_insert((bx, by, bx, by));
            b.0 = b.0.min(bx);
            b.1 = b.1.min(by);
            b.2 = b.2.max(bx);
            b.3 = b.3.max(by);
        }
        let (bx0, by0, bx1, by1) = bounds?;
        let bs = self.block_size;
        let (x, y) = (bx0 * bs, by0 * bs);
        let x_end = ((bx1 + 1) * bs).min(self.width);
        let y_end = ((by1 + 1) * bs).min(self.height);
        Some(Rect {
            x,
            y,
            width: x_end.saturating_sub(x),
            height: y_end.saturating_sub(y),
        })
    }

    /// Intensity standard deviation of the block covering pixel `(x, y)`.
    pub fn contrast_at(&self, x: usize, y: usize) -> f32 {
        self.contrast
            .get(x / self.block_size, y / self.block_size)
            .unwrap_or(0.0)
    }
}

/// Marks blocks whose intensity variance and orientation coherence both
/// exceed the thresholds, then drops foreground blocks without a foreground
/// 8-neighbour.
pub(crate) fn segment(
    img: &Grid<f32>,
    directions: &DirectionMap,
    variance_threshold: f32,
    coherence_threshold: f32,
) -> RidgeMatchResult<SegmentationMask> {
    let width = img.width();
    let height = img.height();
    let block_size = directions.block_size();
    let cells = directions.blocks();
    let blocks_x = cells.width();
    let blocks_y = cells.height();

    let mut contrast = Grid::new(blocks_x, blocks_y, 0.0f32)?;
    let mut raw = Grid::new(blocks_x, blocks_y, false)?;
    for (bx, by, cell) in cells.cells() {
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut count = 0usize;
        let x_end = ((bx + 1) * block_size).min(width);
        for y in by * block_size..((by + 1) * block_size).min(height) {
            let Some(row) = img.row(y) else {
                continue;
            };
            for &v in &row[bx * block_size..x_end] {
                let v = f64::from(v);
                sum += v;
                sum_sq += v * v;
                count += 1;
            }
        }
        if count == 0 {
            continue;
        }
        let mean = sum / count as f64;
        let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
        contrast.set(bx, by, variance.sqrt() as f32);
        raw.set(
            bx,
            by,
            variance > f64::from(variance_threshold) && cell.coherence > coherence_threshold,
        );
    }

    let mut blocks = raw.clone();
    for (bx, by, set) in raw.cells() {
        if !set {
            continue;
        }
        let (bx, by) = (bx as isize, by as isize);
        let has_neighbour = (-1..=1).any(|dy| {
            (-1..=1).any(|dx| (dx != 0 || dy != 0) && raw.is_set(bx + dx, by + dy))
        });
        if !has_neighbour {
            blocks.set(bx as usize, by as usize, false);
        }
    }

    Ok(SegmentationMask {
        blocks,
        contrast,
        block_size,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::{segment, SegmentationMask};
    use crate::image::{Grid, Rect};
    use crate::preprocess::orientation::estimate;

    fn patch_image(patch: (usize, usize, usize, usize)) -> Grid<f32> {
        let (px0, py0, px1, py1) = patch;
        let (w, h) = (96, 96);
        let data = (0..w * h)
            .map(|idx| {
                let (x, y) = (idx % w, idx / w);
                if (px0..px1).contains(&x) && (py0..py1).contains(&y) {
                    128.0 + 100.0 * (2.0 * std::f32::consts::PI * x as f32 / 8.0).cos()
                } else {
                    200.0
                }
            })
            .collect();
        Grid::from_vec(data, w, h).unwrap()
    }

    #[test]
    fn striped_region_becomes_foreground() {
        let img = patch_image((16, 16, 80, 80));
        let dirs = estimate(&img, 16, 1).unwrap();
        let mask = segment(&img, &dirs, 100.0, 0.15).unwrap();
        assert!(mask.is_foreground(40, 40));
        assert!(!mask.is_foreground(4, 4));
        assert!(mask.contrast_at(40, 40) > 50.0);
        assert!(mask.square_is_foreground(48, 48, 12));
        assert!(!mask.square_is_foreground(20, 48, 12));
        assert!(!mask.square_is_foreground(5, 48, 12));
    }

    #[test]
    fn isolated_block_is_dropped() {
        let img = patch_image((32, 32, 48, 48));
        let dirs = estimate(&img, 16, 1).unwrap();
        let mask = segment(&img, &dirs, 100.0, 0.15).unwrap();
        assert_eq!(mask.foreground_blocks(), 0);
    }

    #[test]
    fn foreground_bounds_cover_foreground_blocks() {
        let img = patch_image((16, 16, 80, 80));
        let dirs = estimate(&img, 16, 1).unwrap();
        let mask = segment(&img, &dirs, 100.0, 0.15).unwrap();
        let rect = mask.foreground_bounds().unwrap();
        assert!(rect.x <= 16 && rect.y <= 16);
        let (x1, y1) = rect.end().unwrap();
        assert!(x1 >= 64 && y1 >= 64 && x1 <= 96 && y1 <= 96);
        assert!(!mask.is_foreground(rect.x.wrapping_sub(1), 48));
    }

    #[test]
    fn foreground_bounds_clip_partial_blocks() {
        let mut blocks = Grid::new(4, 3, false).unwrap();
        blocks.set(1, 0, true);
        blocks.set(3, 2, true);
        let mask = SegmentationMask::from_blocks(blocks, 60, 40, 16).unwrap();
        assert_eq!(
            mask.foreground_bounds(),
            Some(Rect {
                x: 16,
                y: 0,
                width: 44,
                height: 40,
            })
        );

        let empty = SegmentationMask::from_blocks(Grid::new(4, 3, false).unwrap(), 60, 40, 16)
            .unwrap();
        assert_eq!(empty.foreground_bounds(), None);
    }
}

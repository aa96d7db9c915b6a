//! Block-wise ridge orientation from Sobel gradients.
//!
//! Gradients are accumulated per block as doubled-angle vectors
//! `(Gxx - Gyy, 2Gxy)` so that opposite gradient directions reinforce instead
//! of cancelling. Smoothing averages those vectors over a square block
//! neighbourhood before the angle is recovered.

use crate::image::Grid;
use crate::util::math::fold_deg_180;
use crate::util::{RidgeMatchError, RidgeMatchResult};

/// Smoothed ridge orientation and coherence of one block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectionCell {
    /// Undirected ridge orientation in degrees, in [0, 180).
    pub angle_deg: f32,
    /// Gradient coherence in [0, 1]; 0 for flat blocks.
    pub coherence: f32,
}

/// Per-block ridge orientation field.
#[derive(Clone, Debug)]
pub struct DirectionMap {
    cells: Grid<DirectionCell>,
    block_size: usize,
    width: usize,
    height: usize,
}

impl DirectionMap {
    /// Creates a map with the same cell in every block.
    pub fn uniform(
        width: usize,
        height: usize,
        block_size: usize,
        angle_deg: f32,
        coherence: f32,
    ) -> RidgeMatchResult<Self> {
        if block_size == 0 {
            return Err(RidgeMatchError::InvalidConfig {
                reason: "block_size must be positive",
            });
        }
        let cell = DirectionCell {
            angle_deg: fold_deg_180(angle_deg),
            coherence: coherence.clamp(0.0, 1.0),
        };
        Ok(Self {
            cells: Grid::new(width.div_ceil(block_size), height.div_ceil(block_size), cell)?,
            block_size,
            width,
            height,
        })
    }

    /// Returns the block edge length in pixels.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the per-block cells.
    pub fn blocks(&self) -> &Grid<DirectionCell> {
        &self.cells
    }

    /// Returns the pixel dimensions the map was estimated for.
    pub fn image_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the cell covering pixel `(x, y)`.
    pub fn cell_at(&self, x: usize, y: usize) -> Option<DirectionCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(x / self.block_size, y / self.block_size)
    }
}

/// Sobel gradients with clamped borders.
pub(crate) fn sobel(img: &Grid<f32>) -> RidgeMatchResult<(Grid<f32>, Grid<f32>)> {
    let width = img.width();
    let height = img.height();
    let at = |x: isize, y: isize| -> f32 {
        let cx = x.clamp(0, width as isize - 1) as usize;
        let cy = y.clamp(0, height as isize - 1) as usize;
        img.get(cx, cy).unwrap_or(0.0)
    };

    let mut gx = Vec::with_capacity(width * height);
    let mut gy = Vec::with_capacity(width * height);
    for y in 0..height as isize {
        for x in 0..width as isize {
            let dx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
            let dy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
            gx.push(dx);
            gy.push(dy);
        }
    }
    Ok((
        Grid::from_vec(gx, width, height)?,
        Grid::from_vec(gy, width, height)?,
    ))
}

#[derive(Clone, Copy, Default)]
struct BlockMoments {
    vx: f64,
    vy: f64,
    energy: f64,
}

/// Estimates the smoothed orientation field of `img`.
pub(crate) fn estimate(
    img: &Grid<f32>,
    block_size: usize,
    smoothing_radius: usize,
) -> RidgeMatchResult<DirectionMap> {
    let (gx, gy) = sobel(img)?;
    let width = img.width();
    let height = img.height();
    let blocks_x = width.div_ceil(block_size);
    let blocks_y = height.div_ceil(block_size);

    let mut moments = Grid::new(blocks_x, blocks_y, BlockMoments::default())?;
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let mut sxx = 0.0f64;
            let mut syy = 0.0f64;
            let mut sxy = 0.0f64;
            let y_end = ((by + 1) * block_size).min(height);
            let x_end = ((bx + 1) * block_size).min(width);
            for y in by * block_size..y_end {
                let (Some(row_x), Some(row_y)) = (gx.row(y), gy.row(y)) else {
                    continue;
                };
                for x in bx * block_size..x_end {
                    let dx = f64::from(row_x[x]);
                    let dy = f64::from(row_y[x]);
                    sxx += dx * dx;
                    syy += dy * dy;
                    sxy += dx * dy;
                }
            }
            moments.set(
                bx,
                by,
                BlockMoments {
                    vx: sxx - syy,
                    vy: 2.0 * sxy,
                    energy: sxx + syy,
                },
            );
        }
    }

    let radius = smoothing_radius as isize;
    let mut cells = Grid::new(blocks_x, blocks_y, DirectionCell::default())?;
    for (bx, by, own) in moments.cells() {
        let mut vx = 0.0f64;
        let mut vy = 0.0f64;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if let Some(m) = moments.get_signed(bx as isize + dx, by as isize + dy) {
                    vx += m.vx;
                    vy += m.vy;
                }
            }
        }
        if vx == 0.0 && vy == 0.0 {
            vx = own.vx;
            vy = own.vy;
        }

        let coherence = if own.energy > f64::EPSILON {
            (own.vx.hypot(own.vy) / own.energy).clamp(0.0, 1.0) as f32
        } else {
            0.0
        };
        let gradient_deg = (0.5 * vy.atan2(vx)).to_degrees() as f32;
        cells.set(
            bx,
            by,
            DirectionCell {
                angle_deg: fold_deg_180(gradient_deg + 90.0),
                coherence,
            },
        );
    }

    Ok(DirectionMap {
        cells,
        block_size,
        width,
        height,
    })
}

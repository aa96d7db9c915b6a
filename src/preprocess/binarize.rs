//! Orientation-guided binarization.
//!
//! Each foreground pixel averages bilinear samples along a short segment
//! parallel to the local ridge and compares that average with the mean of a
//! square window around it. Dark (below the local mean) pixels become ridge.

use crate::image::Grid;
use crate::preprocess::orientation::DirectionMap;
use crate::preprocess::segment::SegmentationMask;
use crate::util::math::sin_cos_deg;
use crate::util::RidgeMatchResult;

/// Two-level ridge/valley image; background pixels are never ridge.
#[derive(Clone, Debug, PartialEq)]
pub struct BinarizedImage {
    grid: Grid<bool>,
}

impl BinarizedImage {
    /// Wraps a ridge grid, `true` for ridge pixels.
    pub fn from_grid(grid: Grid<bool>) -> Self {
        Self { grid }
    }

    /// Returns the underlying grid, `true` for ridge pixels.
    pub fn as_grid(&self) -> &Grid<bool> {
        &self.grid
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Returns true when `(x, y)` is a ridge pixel.
    pub fn is_ridge(&self, x: usize, y: usize) -> bool {
        self.grid.get(x, y).unwrap_or(false)
    }

    /// Counts ridge pixels.
    pub fn ridge_pixels(&self) -> usize {
        self.grid.count_set()
    }

    /// Renders the image as 8-bit luma with black ridges on white.
    pub fn to_luma(&self) -> Vec<u8> {
        self.grid
            .as_slice()
            .iter()
            .map(|&ridge| if ridge { 0 } else { 255 })
            .collect()
    }
}

/// Summed-area table with one row/column of zero padding.
struct IntegralImage {
    sums: Vec<f64>,
    stride: usize,
}

impl IntegralImage {
    fn new(img: &Grid<f32>) -> Self {
        let stride = img.width() + 1;
        let mut sums = vec![0.0f64; stride * (img.height() + 1)];
        for y in 0..img.height() {
            let mut row_sum = 0.0f64;
            if let Some(row) = img.row(y) {
                for (x, &v) in row.iter().enumerate() {
                    row_sum += f64::from(v);
                    sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
                }
            }
        }
        Self { sums, stride }
    }

    /// Mean over the half-open rectangle `[x0, x1) x [y0, y1)`.
    fn mean(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f32 {
        let area = (x1 - x0) * (y1 - y0);
        if area == 0 {
            return 0.0;
        }
        let s = self.stride;
        let total = self.sums[y1 * s + x1] - self.sums[y0 * s + x1] - self.sums[y1 * s + x0]
            + self.sums[y0 * s + x0];
        (total / area as f64) as f32
    }
}

pub(crate) fn binarize(
    img: &Grid<f32>,
    directions: &DirectionMap,
    mask: &SegmentationMask,
    half_length: usize,
) -> RidgeMatchResult<BinarizedImage> {
    let width = img.width();
    let height = img.height();
    let integral = IntegralImage::new(img);
    let window = directions.block_size();
    let before = window / 2;
    let after = window - before;
    let half = half_length as isize;

    let mut raw = Grid::new(width, height, false)?;
    for y in 0..height {
        for x in 0..width {
            if !mask.is_foreground(x, y) {
                continue;
            }
            let Some(cell) = directions.cell_at(x, y) else {
                continue;
            };
            let (sin, cos) = sin_cos_deg(cell.angle_deg);
            let mut along = 0.0f32;
            for t in -half..=half {
                let t = t as f32;
                along += img.sample_bilinear(x as f32 + t * cos, y as f32 + t * sin);
            }
            along /= (2 * half_length + 1) as f32;

            let local = integral.mean(
                x.saturating_sub(before),
                y.saturating_sub(before),
                (x + after).min(width),
                (y + after).min(height),
            );
            raw.set(x, y, along < local);
        }
    }

    Ok(BinarizedImage::from_grid(majority_filter(&raw, mask)?))
}

/// One 3x3 majority pass restricted to the foreground.
fn majority_filter(raw: &Grid<bool>, mask: &SegmentationMask) -> RidgeMatchResult<Grid<bool>> {
    let mut out = Grid::new(raw.width(), raw.height(), false)?;
    for (x, y, _) in raw.cells() {
        if !mask.is_foreground(x, y) {
            continue;
        }
        let (sx, sy) = (x as isize, y as isize);
        let votes = (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| raw.is_set(sx + dx, sy + dy))
            .count();
        out.set(x, y, votes >= 5);
    }
    Ok(out)
}

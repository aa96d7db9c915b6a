//! Topology-preserving thinning of the binarized image.
//!
//! Each iteration runs two directional sub-passes. A sub-pass first collects
//! the removable pixels against a snapshot of the grid and then deletes them
//! one by one in raster order, re-checking each against the live grid. The
//! re-check keeps two-pixel-thick runs from vanishing entirely.

pub(crate) mod table;

use crate::image::Grid;
use crate::preprocess::{BinarizedImage, SegmentationMask};
use crate::trace::{trace_event, trace_span};
use crate::util::RidgeMatchResult;
use table::{NEIGHBOR_OFFSETS, REMOVABLE};

/// One-pixel-wide ridge centre lines.
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    grid: Grid<bool>,
}

impl Skeleton {
    /// Wraps a grid that is already one pixel wide.
    pub fn from_grid(grid: Grid<bool>) -> Self {
        Self { grid }
    }

    /// Returns the underlying grid, `true` for skeleton pixels.
    pub fn as_grid(&self) -> &Grid<bool> {
        &self.grid
    }

    /// Returns true when `(x, y)` is a skeleton pixel.
    pub fn is_ridge(&self, x: usize, y: usize) -> bool {
        self.grid.get(x, y).unwrap_or(false)
    }

    /// Counts skeleton pixels.
    pub fn ridge_pixels(&self) -> usize {
        self.grid.count_set()
    }

    /// Number of 8-neighbours of `(x, y)` that are skeleton pixels.
    pub fn neighbor_count(&self, x: usize, y: usize) -> u32 {
        neighbor_pattern(&self.grid, x, y).count_ones()
    }
}

/// Packs the 8-neighbourhood of `(x, y)` into a byte, see [`table`].
pub(crate) fn neighbor_pattern(grid: &Grid<bool>, x: usize, y: usize) -> u8 {
    let (sx, sy) = (x as isize, y as isize);
    NEIGHBOR_OFFSETS
        .iter()
        .enumerate()
        .fold(0u8, |acc, (k, &(dx, dy))| {
            if grid.is_set(sx + dx, sy + dy) {
                acc | (1 << k)
            } else {
                acc
            }
        })
}

/// Thins the foreground ridges of `binarized` to single-pixel lines.
///
/// Stops at a fixed point or after `max_iterations` full iterations.
pub fn thin(
    binarized: &BinarizedImage,
    mask: &SegmentationMask,
    max_iterations: usize,
) -> RidgeMatchResult<Skeleton> {
    let _span = trace_span!("skeletonize").entered();

    let source = binarized.as_grid();
    let mut grid = Grid::new(source.width(), source.height(), false)?;
    let mut pixels = Vec::new();
    for (x, y, ridge) in source.cells() {
        if ridge && mask.is_foreground(x, y) {
            grid.set(x, y, true);
            pixels.push((x, y));
        }
    }

    let mut iterations = 0usize;
    while iterations < max_iterations {
        iterations += 1;
        let mut changed = false;
        for pass in REMOVABLE.iter() {
            let marked: Vec<(usize, usize)> = pixels
                .iter()
                .copied()
                .filter(|&(x, y)| pass[neighbor_pattern(&grid, x, y) as usize])
                .collect();
            for (x, y) in marked {
                if pass[neighbor_pattern(&grid, x, y) as usize] {
                    grid.set(x, y, false);
                    changed = true;
                }
            }
            pixels.retain(|&(x, y)| grid.get(x, y).unwrap_or(false));
        }
        if !changed {
            break;
        }
    }

    trace_event!(
        "skeleton",
        iterations = iterations,
        ridge_pixels = pixels.len()
    );
    Ok(Skeleton { grid })
}

#[cfg(test)]
mod tests {
    use super::{neighbor_pattern, thin};
    use crate::image::Grid;
    use crate::preprocess::{BinarizedImage, SegmentationMask};
    use crate::skeleton::table::connectivity_number;

    fn full_mask(width: usize, height: usize) -> SegmentationMask {
        SegmentationMask::all_foreground(width, height, 8).unwrap()
    }

    fn bar(width: usize, height: usize, x0: usize, x1: usize, y0: usize, y1: usize) -> Grid<bool> {
        let mut grid = Grid::new(width, height, false).unwrap();
        for y in y0..y1 {
            for x in x0..x1 {
                grid.set(x, y, true);
            }
        }
        grid
    }

    #[test]
    fn thick_bar_thins_to_one_pixel_line() {
        let bin = BinarizedImage::from_grid(bar(32, 32, 10, 15, 4, 28));
        let skel = thin(&bin, &full_mask(32, 32), 64).unwrap();
        assert!(skel.ridge_pixels() > 0);
        for y in 8..24 {
            let row: usize = (0..32).filter(|&x| skel.is_ridge(x, y)).count();
            assert_eq!(row, 1, "row {y} is not one pixel wide");
        }
        for y in 8..24 {
            for x in 0..32 {
                if skel.is_ridge(x, y) {
                    assert_eq!(skel.neighbor_count(x, y), 2, "blob at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn two_by_two_block_is_not_erased() {
        let bin = BinarizedImage::from_grid(bar(8, 8, 3, 5, 3, 5));
        let skel = thin(&bin, &full_mask(8, 8), 64).unwrap();
        assert!(skel.ridge_pixels() >= 1);
    }

    #[test]
    fn one_pixel_line_is_a_fixed_point() {
        let line = bar(16, 16, 7, 8, 2, 14);
        let bin = BinarizedImage::from_grid(line.clone());
        let skel = thin(&bin, &full_mask(16, 16), 64).unwrap();
        assert_eq!(skel.as_grid(), &line);
        assert_eq!(skel.neighbor_count(7, 2), 1);
        assert_eq!(connectivity_number(neighbor_pattern(&line, 7, 8)), 2);
    }

    #[test]
    fn zero_iterations_leave_input_unchanged() {
        let grid = bar(16, 16, 4, 10, 4, 10);
        let bin = BinarizedImage::from_grid(grid.clone());
        let skel = thin(&bin, &full_mask(16, 16), 0).unwrap();
        assert_eq!(skel.as_grid(), &grid);
    }
}

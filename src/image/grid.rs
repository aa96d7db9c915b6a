//! Bounds-checked row-major 2D grid.

use crate::util::{RidgeMatchError, RidgeMatchResult};

/// Dense 2D grid indexed by `(x, y)` with `x` the column and `y` the row.
///
/// All accessors are bounds-checked; out-of-range reads return `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Copy> Grid<T> {
    /// Creates a grid filled with `fill`.
    pub fn new(width: usize, height: usize, fill: T) -> RidgeMatchResult<Self> {
        let len = width
            .checked_mul(height)
            .filter(|&len| len > 0)
            .ok_or(RidgeMatchError::InvalidDimensions { width, height })?;
        Ok(Self {
            data: vec![fill; len],
            width,
            height,
        })
    }

    /// Wraps a row-major buffer of exactly `width * height` cells.
    pub fn from_vec(data: Vec<T>, width: usize, height: usize) -> RidgeMatchResult<Self> {
        let len = width
            .checked_mul(height)
            .filter(|&len| len > 0)
            .ok_or(RidgeMatchError::InvalidDimensions { width, height })?;
        if data.len() != len {
            return Err(RidgeMatchError::BufferTooSmall {
                needed: len,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the grid width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the cell at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Returns the cell at signed coordinates, `None` when outside the grid.
    pub fn get_signed(&self, x: isize, y: isize) -> Option<T> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get(x as usize, y as usize)
    }

    /// Returns row `y` as a slice.
    pub fn row(&self, y: usize) -> Option<&[T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.data.get(start..start + self.width)
    }

    /// Returns the row-major backing slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterates over `(x, y, value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(idx, &v)| (idx % width, idx / width, v))
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, value: T) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }
}

impl Grid<f32> {
    /// Samples bilinearly at a floating-point position, clamping to the border.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let sx = if x.is_finite() { x.clamp(0.0, max_x) } else { 0.0 };
        let sy = if y.is_finite() { y.clamp(0.0, max_y) } else { 0.0 };
        let x0 = sx.floor() as usize;
        let y0 = sy.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = sx - x0 as f32;
        let fy = sy - y0 as f32;

        let a = self.data[y0 * self.width + x0];
        let b = self.data[y0 * self.width + x1];
        let c = self.data[y1 * self.width + x0];
        let d = self.data[y1 * self.width + x1];

        let w00 = (1.0 - fx) * (1.0 - fy);
        let w10 = fx * (1.0 - fy);
        let w01 = (1.0 - fx) * fy;
        let w11 = fx * fy;
        a * w00 + b * w10 + c * w01 + d * w11
    }
}

impl Grid<bool> {
    /// Counts the cells set to `true`.
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Reads a cell as `false` when outside the grid.
    pub fn is_set(&self, x: isize, y: isize) -> bool {
        self.get_signed(x, y).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::Grid;
    use crate::RidgeMatchError;

    #[test]
    fn grid_accessors_are_bounds_checked() {
        let mut grid = Grid::new(3, 2, 0u8).unwrap();
        grid.set(2, 1, 7);
        grid.set(5, 5, 9);
        assert_eq!(grid.get(2, 1), Some(7));
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get_signed(-1, 0), None);
        assert_eq!(grid.row(1).unwrap(), &[0, 0, 7]);
        assert!(grid.row(2).is_none());
        let cells: Vec<_> = grid.cells().filter(|c| c.2 != 0).collect();
        assert_eq!(cells, vec![(2, 1, 7)]);
    }

    #[test]
    fn grid_rejects_mismatched_buffers() {
        assert_eq!(
            Grid::from_vec(vec![0u8; 5], 3, 2).unwrap_err(),
            RidgeMatchError::BufferTooSmall { needed: 6, got: 5 }
        );
        assert_eq!(
            Grid::new(0, 2, false).unwrap_err(),
            RidgeMatchError::InvalidDimensions {
                width: 0,
                height: 2
            }
        );
    }

    #[test]
    fn bool_grid_treats_outside_as_unset() {
        let mut grid = Grid::new(2, 2, false).unwrap();
        grid.set(0, 0, true);
        assert!(grid.is_set(0, 0));
        assert!(!grid.is_set(-1, 0));
        assert_eq!(grid.count_set(), 1);
    }
}

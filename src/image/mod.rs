//! Grayscale capture views, owned captures and 2D grids.
//!
//! An [`ImageView`] borrows 8-bit samples laid out row by row, where
//! `stride` samples separate the starts of consecutive rows. Padded rows
//! (stride above width) are accepted so frames from scanner SDKs can be
//! wrapped without copying. A [`RidgeImage`] owns a tightly packed capture
//! and remembers the resolution it was scanned at.

use crate::util::{RidgeMatchError, RidgeMatchResult};

pub mod grid;
#[cfg(feature = "image-io")]
pub mod io;
pub(crate) mod resample;

pub use grid::Grid;

/// Axis-aligned pixel rectangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    /// One past the last column and row.
    pub fn end(&self) -> Option<(usize, usize)> {
        Some((
            self.x.checked_add(self.width)?,
            self.y.checked_add(self.height)?,
        ))
    }

    fn out_of_bounds(&self) -> RidgeMatchError {
        RidgeMatchError::RegionOutOfBounds {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Borrowed 8-bit grayscale capture.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a> {
    samples: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> ImageView<'a> {
    /// Wraps tightly packed rows.
    pub fn from_slice(samples: &'a [u8], width: usize, height: usize) -> RidgeMatchResult<Self> {
        Self::new(samples, width, height, width)
    }

    /// Wraps rows that start `stride` samples apart.
    pub fn new(
        samples: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> RidgeMatchResult<Self> {
        let needed = span_len(width, height, stride)?;
        if samples.len() < needed {
            return Err(RidgeMatchError::BufferTooSmall {
                needed,
                got: samples.len(),
            });
        }
        Ok(Self {
            samples,
            width,
            height,
            stride,
        })
    }

    /// Visible columns per row, excluding padding.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Samples between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Sample at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.row(y).and_then(|row| row.get(x).copied())
    }

    /// Row `y` without its padding.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        self.samples.get(start..start + self.width)
    }

    /// Iterates over the rows top to bottom, padding stripped.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let (samples, width, stride) = (self.samples, self.width, self.stride);
        (0..self.height).map(move |y| &samples[y * stride..y * stride + width])
    }

    /// Borrows the samples inside `rect` without copying; the stride is kept.
    pub fn crop(&self, rect: Rect) -> RidgeMatchResult<ImageView<'a>> {
        let fits = rect
            .end()
            .is_some_and(|(x1, y1)| x1 <= self.width && y1 <= self.height);
        if rect.width == 0 || rect.height == 0 || !fits {
            return Err(rect.out_of_bounds());
        }
        let start = rect.y * self.stride + rect.x;
        let samples = self
            .samples
            .get(start..)
            .ok_or_else(|| rect.out_of_bounds())?;
        Self::new(samples, rect.width, rect.height, self.stride)
    }

    /// Copies the samples into a row-major `f32` grid.
    pub(crate) fn to_f32_grid(&self) -> RidgeMatchResult<Grid<f32>> {
        let data = self.rows().flatten().map(|&v| f32::from(v)).collect();
        Grid::from_vec(data, self.width, self.height)
    }
}

/// Samples spanned by `height` rows of `width` starting `stride` apart.
fn span_len(width: usize, height: usize, stride: usize) -> RidgeMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(RidgeMatchError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(RidgeMatchError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(RidgeMatchError::InvalidDimensions { width, height })
}

/// Owned grayscale fingerprint capture with its scan resolution.
#[derive(Clone, Debug)]
pub struct RidgeImage {
    samples: Vec<u8>,
    width: usize,
    height: usize,
    ppi: u32,
}

impl RidgeImage {
    /// Takes ownership of exactly `width * height` packed samples.
    pub fn new(samples: Vec<u8>, width: usize, height: usize, ppi: u32) -> RidgeMatchResult<Self> {
        if ppi == 0 {
            return Err(RidgeMatchError::InvalidResolution { ppi });
        }
        let needed = span_len(width, height, width)?;
        match samples.len() {
            n if n < needed => Err(RidgeMatchError::BufferTooSmall { needed, got: n }),
            n if n > needed => Err(RidgeMatchError::InvalidDimensions { width, height }),
            _ => Ok(Self {
                samples,
                width,
                height,
                ppi,
            }),
        }
    }

    /// Packs a borrowed capture, dropping row padding.
    pub fn from_view(view: ImageView<'_>, ppi: u32) -> RidgeMatchResult<Self> {
        let samples = view.rows().flatten().copied().collect();
        Self::new(samples, view.width(), view.height(), ppi)
    }

    /// Borrows the capture as a packed view (stride equals width).
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            samples: &self.samples,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Capture width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Capture height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Scan resolution in pixels per inch.
    pub fn ppi(&self) -> u32 {
        self.ppi
    }

    /// Packed samples, row by row.
    pub fn data(&self) -> &[u8] {
        &self.samples
    }

    /// Copies the samples inside `rect` into a new capture at the same
    /// resolution.
    pub fn crop(&self, rect: Rect) -> RidgeMatchResult<RidgeImage> {
        Self::from_view(self.view().crop(rect)?, self.ppi)
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageView, Rect, RidgeImage};
    use crate::util::RidgeMatchError;

    #[test]
    fn rows_skip_padding() {
        let data = [1u8, 2, 0, 3, 4, 0, 5, 6];
        let view = ImageView::new(&data, 2, 3, 3).unwrap();
        let rows: Vec<&[u8]> = view.rows().collect();
        assert_eq!(rows, vec![&[1u8, 2][..], &[3, 4], &[5, 6]]);
        let grid = view.to_f32_grid().unwrap();
        assert_eq!(grid.get(1, 2), Some(6.0));
    }

    #[test]
    fn packed_copy_matches_view() {
        let data = [9u8, 8, 7, 0, 6, 5, 4, 0];
        let view = ImageView::new(&data, 3, 2, 4).unwrap();
        let owned = RidgeImage::from_view(view, 1000).unwrap();
        assert_eq!(owned.data(), &[9, 8, 7, 6, 5, 4]);
        assert_eq!(owned.view().get(0, 1), Some(6));
    }

    #[test]
    fn accessors_report_geometry() {
        let data = [0u8; 12];
        let view = ImageView::new(&data, 3, 2, 5).unwrap();
        assert_eq!((view.width(), view.height(), view.stride()), (3, 2, 5));

        let owned = RidgeImage::new(vec![0; 6], 3, 2, 500).unwrap();
        assert_eq!((owned.width(), owned.height()), (3, 2));
        let packed = owned.view();
        assert_eq!((packed.width(), packed.height(), packed.stride()), (3, 2, 3));
    }

    #[test]
    fn crop_borrows_inner_rectangle() {
        let data: Vec<u8> = (0..20).collect();
        let view = ImageView::new(&data, 4, 4, 5).unwrap();
        let rect = Rect {
            x: 1,
            y: 2,
            width: 2,
            height: 2,
        };
        let inner = view.crop(rect).unwrap();
        assert_eq!((inner.width(), inner.height(), inner.stride()), (2, 2, 5));
        let rows: Vec<&[u8]> = inner.rows().collect();
        assert_eq!(rows, vec![&[11u8, 12][..], &[16, 17]]);

        let owned = RidgeImage::from_view(view, 250).unwrap();
        let copy = owned.crop(rect).unwrap();
        assert_eq!(copy.data(), &[11, 12, 16, 17]);
        assert_eq!(copy.ppi(), 250);
    }

    #[test]
    fn crop_rejects_empty_or_outside_rectangles() {
        let data = [0u8; 16];
        let view = ImageView::from_slice(&data, 4, 4).unwrap();
        let outside = Rect {
            x: 3,
            y: 0,
            width: 2,
            height: 1,
        };
        assert_eq!(
            view.crop(outside).unwrap_err(),
            RidgeMatchError::RegionOutOfBounds {
                x: 3,
                y: 0,
                width: 2,
                height: 1,
            }
        );
        let empty = Rect {
            x: 0,
            y: 0,
            width: 0,
            height: 4,
        };
        assert!(view.crop(empty).is_err());
        let huge = Rect {
            x: usize::MAX,
            y: 0,
            width: 2,
            height: 1,
        };
        assert!(view.crop(huge).is_err());
    }
}

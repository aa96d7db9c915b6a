//! Resolution normalization by bilinear resampling.
//!
//! The matcher assumes every minutia set lives at the same scale, so captures
//! whose resolution differs from the reference are resampled before any
//! orientation estimation happens. Source coordinates follow pixel centers:
//! `src = (dst + 0.5) / scale - 0.5`, clamped to the valid range.

use crate::image::{ImageView, RidgeImage};
use crate::util::{RidgeMatchError, RidgeMatchResult};

/// Relative resolution difference below which no resampling happens.
const PPI_TOLERANCE: f32 = 0.02;

/// Accepted range of `reference_ppi / ppi`.
const SCALE_RANGE: std::ops::RangeInclusive<f32> = 0.25..=4.0;

/// Resamples `src` to `reference_ppi` when its resolution differs noticeably.
///
/// Returns `None` when the capture is already at the reference resolution.
pub(crate) fn normalize_resolution(
    src: ImageView<'_>,
    ppi: u32,
    reference_ppi: u32,
) -> RidgeMatchResult<Option<RidgeImage>> {
    if ppi == 0 {
        return Err(RidgeMatchError::InvalidResolution { ppi });
    }
    let scale = reference_ppi as f32 / ppi as f32;
    if !SCALE_RANGE.contains(&scale) {
        return Err(RidgeMatchError::InvalidResolution { ppi });
    }
    if (scale - 1.0).abs() <= PPI_TOLERANCE {
        return Ok(None);
    }

    let width = ((src.width() as f32 * scale).round() as usize).max(1);
    let height = ((src.height() as f32 * scale).round() as usize).max(1);
    if width.checked_mul(height).is_none() {
        return Err(RidgeMatchError::InvalidDimensions { width, height });
    }
    let samples = src.to_f32_grid()?;
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let sy = (y as f32 + 0.5) / scale - 0.5;
        for x in 0..width {
            let sx = (x as f32 + 0.5) / scale - 0.5;
            let value = samples.sample_bilinear(sx, sy);
            out.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }
    RidgeImage::new(out, width, height, reference_ppi).map(Some)
}

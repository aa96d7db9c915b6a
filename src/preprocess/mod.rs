//! Orientation estimation, segmentation and binarization.
//!
//! The preprocessor turns a resolution-normalized grayscale capture into the
//! three maps every later stage reads: a block orientation field, a
//! block-resolution foreground mask and a ridge/valley image.

mod binarize;
mod orientation;
mod segment;

pub use binarize::BinarizedImage;
pub use orientation::{DirectionCell, DirectionMap};
pub use segment::SegmentationMask;

use crate::extract::ExtractConfig;
use crate::image::ImageView;
use crate::trace::{trace_event, trace_span};
use crate::util::{RidgeMatchError, RidgeMatchResult};

/// Output of the preprocessing stage.
#[derive(Clone, Debug)]
pub struct Preprocessed {
    /// Smoothed block orientation field.
    pub directions: DirectionMap,
    /// Foreground blocks.
    pub mask: SegmentationMask,
    /// Ridge/valley image, background cleared.
    pub binarized: BinarizedImage,
}

/// Runs orientation estimation, segmentation and binarization.
///
/// Returns [`RidgeMatchError::QualityTooLow`] when no block qualifies as
/// foreground.
pub fn preprocess(image: ImageView<'_>, cfg: &ExtractConfig) -> RidgeMatchResult<Preprocessed> {
    let _span = trace_span!(
        "preprocess",
        width = image.width(),
        height = image.height()
    )
    .entered();

    let min = cfg.block_size;
    if image.width() < min || image.height() < min {
        return Err(RidgeMatchError::ImageTooSmall {
            width: image.width(),
            height: image.height(),
            min,
        });
    }

    let samples = image.to_f32_grid()?;
    let directions =
        orientation::estimate(&samples, cfg.block_size, cfg.orientation_smoothing_radius)?;
    let mask = segment::segment(
        &samples,
        &directions,
        cfg.variance_threshold,
        cfg.coherence_threshold,
    )?;
    let foreground_blocks = mask.foreground_blocks();
    trace_event!("segmentation", foreground_blocks = foreground_blocks);
    if foreground_blocks == 0 {
        return Err(RidgeMatchError::QualityTooLow { foreground_blocks });
    }

    let binarized = binarize::binarize(&samples, &directions, &mask, cfg.binarize_half_length)?;
    trace_event!("binarize", ridge_pixels = binarized.ridge_pixels());

    Ok(Preprocessed {
        directions,
        mask,
        binarized,
    })
}

#[cfg(test)]
mod tests {
    use super::preprocess;
    use crate::{ExtractConfig, ImageView, RidgeMatchError};

    #[test]
    fn blank_image_has_no_foreground() {
        let data = vec![255u8; 64 * 64];
        let view = ImageView::from_slice(&data, 64, 64).unwrap();
        let err = preprocess(view, &ExtractConfig::default()).unwrap_err();
        assert_eq!(
            err,
            RidgeMatchError::QualityTooLow {
                foreground_blocks: 0
            }
        );
    }

    #[test]
    fn tiny_image_is_rejected() {
        let data = vec![0u8; 8 * 8];
        let view = ImageView::from_slice(&data, 8, 8).unwrap();
        let err = preprocess(view, &ExtractConfig::default()).unwrap_err();
        assert!(err.is_invalid_image());
    }
}

//! End-to-end minutiae extraction.
//!
//! `Extractor` normalizes resolution, then runs preprocessing, thinning,
//! detection and filtering with one validated [`ExtractConfig`].

use crate::detect::detect;
use crate::filter::filter;
use crate::image::resample::normalize_resolution;
use crate::image::{ImageView, RidgeImage};
use crate::minutia::MinutiaSet;
use crate::preprocess::{preprocess, BinarizedImage, DirectionMap, Preprocessed, SegmentationMask};
use crate::skeleton::{thin, Skeleton};
use crate::trace::{trace_event, trace_span};
use crate::util::{RidgeMatchError, RidgeMatchResult};

/// Configuration for minutiae extraction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractConfig {
    /// Orientation/segmentation block edge in pixels.
    pub block_size: usize,
    /// Block radius of the orientation vector smoothing.
    pub orientation_smoothing_radius: usize,
    /// Minimum block intensity variance for foreground.
    pub variance_threshold: f32,
    /// Minimum block coherence for foreground.
    pub coherence_threshold: f32,
    /// Half-length of the ridge-parallel binarization segment.
    pub binarize_half_length: usize,
    /// Cap on full thinning iterations.
    pub max_thinning_iterations: usize,
    /// Ridge walk length used to direct minutia angles.
    pub trace_length: usize,
    /// Required distance to the image edge and to background blocks.
    pub boundary_margin: usize,
    /// Minutiae closer than this are discarded in pairs.
    pub min_separation: f32,
    /// Ridge fragments and spurs up to this length are discarded.
    pub min_ridge_length: usize,
    /// Minimum local coherence of an emitted minutia.
    pub min_coherence: f32,
    /// Block standard deviation mapped to full contrast reliability.
    pub contrast_reference: f32,
    /// Neighbour distance mapped to full isolation reliability.
    pub isolation_distance: f32,
    /// Resolution every capture is resampled to.
    pub reference_ppi: u32,
    /// Extract batches in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            block_size: 16,
            orientation_smoothing_radius: 1,
            variance_threshold: 100.0,
            coherence_threshold: 0.15,
            binarize_half_length: 4,
            max_thinning_iterations: 64,
            trace_length: 10,
            boundary_margin: 12,
            min_separation: 8.0,
            min_ridge_length: 10,
            min_coherence: 0.3,
            contrast_reference: 64.0,
            isolation_distance: 24.0,
            reference_ppi: 500,
            parallel: false,
        }
    }
}

impl ExtractConfig {
    /// Checks that every option is in range.
    pub fn validate(&self) -> RidgeMatchResult<()> {
        let invalid = |reason| Err(RidgeMatchError::InvalidConfig { reason });
        if self.block_size < 4 {
            return invalid("block_size must be at least 4");
        }
        if self.binarize_half_length == 0 {
            return invalid("binarize_half_length must be positive");
        }
        if self.trace_length == 0 {
            return invalid("trace_length must be positive");
        }
        if self.reference_ppi == 0 {
            return invalid("reference_ppi must be positive");
        }
        let finite_non_negative = |v: f32| v.is_finite() && v >= 0.0;
        if !finite_non_negative(self.variance_threshold)
            || !finite_non_negative(self.min_separation)
        {
            return invalid("variance_threshold and min_separation must be finite and non-negative");
        }
        if !(0.0..=1.0).contains(&self.coherence_threshold)
            || !(0.0..=1.0).contains(&self.min_coherence)
        {
            return invalid("coherence thresholds must lie in [0, 1]");
        }
        if !(self.contrast_reference.is_finite() && self.contrast_reference > 0.0)
            || !(self.isolation_distance.is_finite() && self.isolation_distance > 0.0)
        {
            return invalid("reliability normalizers must be positive");
        }
        Ok(())
    }
}

/// Minutiae and the intermediate maps they were extracted from.
#[derive(Clone, Debug)]
pub struct Extraction {
    minutiae: MinutiaSet,
    preprocessed: Preprocessed,
    skeleton: Skeleton,
    ppi: u32,
    scale: f32,
}

impl Extraction {
    /// Returns the filtered minutiae in the normalized frame.
    pub fn minutiae(&self) -> &MinutiaSet {
        &self.minutiae
    }

    /// Returns the preprocessing maps.
    pub fn preprocessed(&self) -> &Preprocessed {
        &self.preprocessed
    }

    pub fn binarized(&self) -> &BinarizedImage {
        &self.preprocessed.binarized
    }

    pub fn directions(&self) -> &DirectionMap {
        &self.preprocessed.directions
    }

    pub fn mask(&self) -> &SegmentationMask {
        &self.preprocessed.mask
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Resolution of the normalized frame.
    pub fn ppi(&self) -> u32 {
        self.ppi
    }

    /// Factor from input pixels to normalized pixels.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Consumes the extraction and returns the minutiae.
    pub fn into_minutiae(self) -> MinutiaSet {
        self.minutiae
    }
}

/// Runs the extraction pipeline with a fixed configuration.
#[derive(Clone, Debug)]
pub struct Extractor {
    cfg: ExtractConfig,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            cfg: ExtractConfig::default(),
        }
    }
}

impl Extractor {
    /// Creates an extractor after validating `cfg`.
    pub fn new(cfg: ExtractConfig) -> RidgeMatchResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the extraction configuration.
    pub fn config(&self) -> &ExtractConfig {
        &self.cfg
    }

    /// Extracts minutiae from an 8-bit capture scanned at `ppi`.
    pub fn extract(&self, image: ImageView<'_>, ppi: u32) -> RidgeMatchResult<Extraction> {
        let _span = trace_span!("extract", ppi = ppi).entered();

        let resampled = normalize_resolution(image, ppi, self.cfg.reference_ppi)?;
        let (view, scale) = match &resampled {
            Some(img) => (img.view(), self.cfg.reference_ppi as f32 / ppi as f32),
            None => (image, 1.0),
        };

        let preprocessed = preprocess(view, &self.cfg)?;
        let skeleton = thin(
            &preprocessed.binarized,
            &preprocessed.mask,
            self.cfg.max_thinning_iterations,
        )?;
        if skeleton.ridge_pixels() == 0 {
            return Err(RidgeMatchError::ExtractionFailure {
                reason: "skeleton is empty despite foreground blocks",
            });
        }

        let walk = self.cfg.trace_length.max(self.cfg.min_ridge_length);
        let raw = detect(&skeleton, &preprocessed.directions, &preprocessed.mask, walk);
        let minutiae = filter(&raw, &preprocessed.directions, &preprocessed.mask, &self.cfg);
        trace_event!("extract", minutiae = minutiae.len());

        Ok(Extraction {
            minutiae,
            preprocessed,
            skeleton,
            ppi: if resampled.is_some() {
                self.cfg.reference_ppi
            } else {
                ppi
            },
            scale,
        })
    }

    /// Extracts minutiae from an owned capture.
    pub fn extract_image(&self, image: &RidgeImage) -> RidgeMatchResult<Extraction> {
        self.extract(image.view(), image.ppi())
    }

    /// Extracts every capture; results keep the input order.
    ///
    /// Runs in parallel when the `rayon` feature is enabled and
    /// [`ExtractConfig::parallel`] is set.
    pub fn extract_batch(&self, images: &[RidgeImage]) -> Vec<RidgeMatchResult<Extraction>> {
        #[cfg(feature = "rayon")]
        {
            if self.cfg.parallel {
                use rayon::prelude::*;
                return images
                    .par_iter()
                    .map(|img| self.extract_image(img))
                    .collect();
            }
        }
        images.iter().map(|img| self.extract_image(img)).collect()
    }
}

/// Extracts minutiae with the default configuration.
///
/// Returns the minutiae together with the binarized ridge image.
pub fn extract_minutiae(
    image: ImageView<'_>,
    ppi: u32,
) -> RidgeMatchResult<(MinutiaSet, BinarizedImage)> {
    let extraction = Extractor::default().extract(image, ppi)?;
    let Extraction {
        minutiae,
        preprocessed,
        ..
    } = extraction;
    Ok((minutiae, preprocessed.binarized))
}

#[cfg(test)]
mod tests {
    use super::{ExtractConfig, Extractor};
    use crate::{ImageView, RidgeMatchError};

    #[test]
    fn default_config_is_valid() {
        assert!(ExtractConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_options_are_rejected() {
        let cfg = ExtractConfig {
            block_size: 2,
            ..ExtractConfig::default()
        };
        assert!(matches!(
            Extractor::new(cfg),
            Err(RidgeMatchError::InvalidConfig { .. })
        ));
        let cfg = ExtractConfig {
            min_coherence: 1.5,
            ..ExtractConfig::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = ExtractConfig {
            contrast_reference: 0.0,
            ..ExtractConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_ppi_is_invalid_image() {
        let data = vec![0u8; 64 * 64];
        let view = ImageView::from_slice(&data, 64, 64).unwrap();
        let err = Extractor::default().extract(view, 0).unwrap_err();
        assert!(err.is_invalid_image());
    }
}

//! A capture bundled with its extraction and optional quality metadata.
//!
//! Quality classification is delegated to an external [`QualityClassifier`];
//! its assessment is carried along for callers and never affects matching.

use crate::extract::{Extraction, Extractor};
use crate::image::RidgeImage;
use crate::matcher::{MatchResult, Matcher};
use crate::minutia::MinutiaSet;
use crate::preprocess::Preprocessed;
use crate::util::{RidgeMatchError, RidgeMatchResult};

/// Quality class of a capture, 1 (best) to 5 (worst).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualityAssessment {
    class: u8,
    confidence: f32,
}

impl QualityAssessment {
    /// Creates an assessment; `class` must lie in 1..=5.
    pub fn new(class: u8, confidence: f32) -> RidgeMatchResult<Self> {
        if !(1..=5).contains(&class) {
            return Err(RidgeMatchError::InvalidConfig {
                reason: "quality class must lie in 1..=5",
            });
        }
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Ok(Self { class, confidence })
    }

    pub fn class(&self) -> u8 {
        self.class
    }

    /// Classifier confidence in [0, 1].
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn label(&self) -> &'static str {
        match self.class {
            1 => "excellent",
            2 => "very good",
            3 => "good",
            4 => "fair",
            _ => "poor",
        }
    }
}

/// Assigns a quality class from the preprocessing maps.
pub trait QualityClassifier {
    fn assess(&self, preprocessed: &Preprocessed) -> RidgeMatchResult<QualityAssessment>;
}

impl<F> QualityClassifier for F
where
    F: Fn(&Preprocessed) -> RidgeMatchResult<QualityAssessment>,
{
    fn assess(&self, preprocessed: &Preprocessed) -> RidgeMatchResult<QualityAssessment> {
        self(preprocessed)
    }
}

/// A capture with its extracted minutiae.
#[derive(Clone, Debug)]
pub struct Fingerprint {
    image: RidgeImage,
    extraction: Extraction,
    quality: Option<QualityAssessment>,
}

impl Fingerprint {
    /// Runs `extractor` on `image`.
    pub fn extract(image: RidgeImage, extractor: &Extractor) -> RidgeMatchResult<Self> {
        let extraction = extractor.extract_image(&image)?;
        Ok(Self {
            image,
            extraction,
            quality: None,
        })
    }

    /// Attaches the assessment of `classifier`.
    pub fn with_quality<C>(mut self, classifier: &C) -> RidgeMatchResult<Self>
    where
        C: QualityClassifier + ?Sized,
    {
        self.quality = Some(classifier.assess(self.extraction.preprocessed())?);
        Ok(self)
    }

    pub fn image(&self) -> &RidgeImage {
        &self.image
    }

    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }

    pub fn minutiae(&self) -> &MinutiaSet {
        self.extraction.minutiae()
    }

    pub fn quality(&self) -> Option<QualityAssessment> {
        self.quality
    }

    /// Compares against another fingerprint.
    pub fn match_against(&self, other: &Fingerprint, matcher: &Matcher) -> MatchResult {
        matcher.match_sets(self.minutiae(), other.minutiae())
    }
}

#[cfg(test)]
mod tests {
    use super::{QualityAssessment, QualityClassifier};
    use crate::image::Grid;
    use crate::preprocess::{BinarizedImage, DirectionMap, Preprocessed, SegmentationMask};

    #[test]
    fn assessment_validates_class() {
        assert!(QualityAssessment::new(0, 0.5).is_err());
        assert!(QualityAssessment::new(6, 0.5).is_err());
        let q = QualityAssessment::new(2, 1.4).unwrap();
        assert_eq!(q.class(), 2);
        assert_eq!(q.confidence(), 1.0);
        assert_eq!(q.label(), "very good");
    }

    #[test]
    fn closures_act_as_classifiers() {
        let pre = Preprocessed {
            directions: DirectionMap::uniform(32, 32, 16, 0.0, 1.0).unwrap(),
            mask: SegmentationMask::all_foreground(32, 32, 16).unwrap(),
            binarized: BinarizedImage::from_grid(Grid::new(32, 32, false).unwrap()),
        };
        let by_coverage = |p: &Preprocessed| {
            let class = if p.mask.foreground_blocks() >= 4 { 1 } else { 5 };
            QualityAssessment::new(class, 0.9)
        };
        assert_eq!(by_coverage.assess(&pre).unwrap().class(), 1);
    }
}

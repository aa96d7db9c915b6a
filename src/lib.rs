//! RidgeMatch extracts fingerprint minutiae and compares minutia sets.
//!
//! Extraction runs a fixed pipeline on a grayscale capture: resolution
//! normalization, orientation-guided binarization, thinning, detection and
//! filtering. Matching scores two minutia sets by the largest group of
//! correspondences that agree on one rigid motion, so captures need no prior
//! alignment. Identification can fan out over a gallery with the `rayon`
//! feature.

mod detect;
pub mod extract;
mod filter;
pub mod fingerprint;
pub mod image;
pub mod lowlevel;
pub mod matcher;
pub mod minutia;
mod preprocess;
mod skeleton;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use image::io::{load_gray_image, ridge_image_from_gray, save_binarized_png};
pub use image::{Grid, ImageView, Rect, RidgeImage};

pub use extract::{extract_minutiae, ExtractConfig, Extraction, Extractor};
pub use fingerprint::{Fingerprint, QualityAssessment, QualityClassifier};
pub use matcher::{
    match_score, Alignment, Candidate, CompiledMinutiae, Correspondence, MatchConfig,
    MatchResult, Matcher, RigidTransform,
};
pub use minutia::{Minutia, MinutiaKind, MinutiaSet};
pub use preprocess::{BinarizedImage, DirectionCell, DirectionMap, Preprocessed, SegmentationMask};
pub use skeleton::Skeleton;
pub use util::{RidgeMatchError, RidgeMatchResult};

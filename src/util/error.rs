//! Error types for ridgematch.

use thiserror::Error;

/// Result alias for ridgematch operations.
pub type RidgeMatchResult<T> = std::result::Result<T, RidgeMatchError>;

/// Errors that can occur when extracting or matching minutiae.
///
/// Empty minutia sets are not an error: matching them yields a score of 0.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RidgeMatchError {
    /// Image width or height is zero or overflows the addressable range.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the image width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the dimensions require.
    #[error("buffer too small: needed {needed} samples, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Image is smaller than a single orientation block.
    #[error("image {width}x{height} is smaller than the minimum {min}x{min}")]
    ImageTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },
    /// Crop rectangle is empty or extends past the image.
    #[error("region {width}x{height} at ({x}, {y}) is outside the image")]
    RegionOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    /// Scan resolution must be a positive number of pixels per inch.
    #[error("invalid scan resolution: {ppi} ppi")]
    InvalidResolution { ppi: u32 },
    /// Image decoding failed.
    #[cfg(feature = "image-io")]
    #[error("image i/o error: {reason}")]
    ImageIo { reason: String },
    /// No block exceeded the foreground thresholds.
    #[error("quality too low: {foreground_blocks} foreground blocks")]
    QualityTooLow { foreground_blocks: usize },
    /// An internal invariant of the extraction pipeline was violated.
    #[error("extraction failed: {reason}")]
    ExtractionFailure { reason: &'static str },
    /// A configuration value is out of range.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
}

impl RidgeMatchError {
    /// Returns true for errors caused by malformed image input.
    pub fn is_invalid_image(&self) -> bool {
        match self {
            Self::InvalidDimensions { .. }
            | Self::InvalidStride { .. }
            | Self::BufferTooSmall { .. }
            | Self::ImageTooSmall { .. }
            | Self::RegionOutOfBounds { .. }
            | Self::InvalidResolution { .. } => true,
            #[cfg(feature = "image-io")]
            Self::ImageIo { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RidgeMatchError;

    #[test]
    fn invalid_image_class_is_grouped() {
        assert!(RidgeMatchError::InvalidResolution { ppi: 0 }.is_invalid_image());
        assert!(RidgeMatchError::BufferTooSmall { needed: 4, got: 3 }.is_invalid_image());
        assert!(!RidgeMatchError::QualityTooLow {
            foreground_blocks: 0
        }
        .is_invalid_image());
        assert!(!RidgeMatchError::ExtractionFailure { reason: "x" }.is_invalid_image());
    }
}

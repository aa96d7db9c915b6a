//! Convenience helpers for loading captures and saving binarized output via
//! the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Any sample depth or
//! color layout the `image` crate decodes is converted to 8-bit luma.

use crate::image::{ImageView, RidgeImage};
use crate::preprocess::BinarizedImage;
use crate::util::{RidgeMatchError, RidgeMatchResult};
use std::path::Path;

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &image::GrayImage) -> RidgeMatchResult<ImageView<'_>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    ImageView::from_slice(img.as_raw(), width, height)
}

/// Creates an owned ridge image from a grayscale image buffer.
pub fn ridge_image_from_gray(img: &image::GrayImage, ppi: u32) -> RidgeMatchResult<RidgeImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    RidgeImage::new(img.as_raw().clone(), width, height, ppi)
}

/// Loads an image from disk as an 8-bit grayscale ridge image.
pub fn load_gray_image<P: AsRef<Path>>(path: P, ppi: u32) -> RidgeMatchResult<RidgeImage> {
    let img = image::open(path).map_err(|err| RidgeMatchError::ImageIo {
        reason: err.to_string(),
    })?;
    ridge_image_from_gray(&img.to_luma8(), ppi)
}

/// Renders a binarized image as a grayscale buffer, black ridges on white.
pub fn binarized_to_gray(img: &BinarizedImage) -> RidgeMatchResult<image::GrayImage> {
    let invalid = RidgeMatchError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    };
    let (Ok(width), Ok(height)) = (u32::try_from(img.width()), u32::try_from(img.height())) else {
        return Err(invalid);
    };
    image::GrayImage::from_raw(width, height, img.to_luma()).ok_or(invalid)
}

/// Writes a binarized image to `path` as an 8-bit grayscale PNG.
pub fn save_binarized_png<P: AsRef<Path>>(img: &BinarizedImage, path: P) -> RidgeMatchResult<()> {
    binarized_to_gray(img)?
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|err| RidgeMatchError::ImageIo {
            reason: err.to_string(),
        })
}

//! Conversions between `image` crate rasters and ndarray arrays.
//!
//! # Coordinate System Conversions
//!
//! - **ndarray**: matrix indexing [row, col] = [y, x] with (height, width) dimensions
//! - **image crate**: graphics indexing (x, y) with (width, height) dimensions
//!
//! Every function here preserves pixel data exactly; only the indexing
//! convention changes.

use image::{GrayImage, RgbImage};
use ndarray::Array2;

/// Convert a color image to grayscale with BT.601 luma weighting.
///
/// Uses the standard weights 0.299 R + 0.587 G + 0.114 B with rounding,
/// the same luma definition the classifier's training images were
/// converted with.
///
/// # Arguments
/// * `rgb` - Decoded 8-bit color image
///
/// # Returns
/// Grayscale raster as `Array2<u8>` with (height, width) dimensions
pub fn rgb_to_gray(rgb: &RgbImage) -> Array2<u8> {
    let (width, height) = rgb.dimensions();
    let mut gray = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        gray[[y as usize, x as usize]] = luma.round().min(255.0) as u8;
    }

    gray
}

/// Convert an `Array2<u8>` back into a `GrayImage` for saving or display.
///
/// Array index [row, col] maps to image pixel (col, row) so orientation is
/// preserved.
pub fn array_to_gray_image(arr: &Array2<u8>) -> GrayImage {
    let (height, width) = arr.dim();
    let mut img = GrayImage::new(width as u32, height as u32);

    for ((row, col), &value) in arr.indexed_iter() {
        img.put_pixel(col as u32, row as u32, image::Luma([value]));
    }

    img
}

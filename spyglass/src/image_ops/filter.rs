//! Rank filters used to suppress shot noise ahead of contrast enhancement.

use ndarray::{Array2, ArrayView2};

/// Apply a square median blur with the given radius.
///
/// A radius of 2 gives the 5x5 neighborhood used by the detection pipeline:
/// strong enough to remove single-pixel shot noise while leaving blobs of a
/// few pixels across intact. Out-of-bounds neighbors are taken from the
/// nearest edge pixel (replicated border).
///
/// # Arguments
/// * `image` - Input grayscale raster
/// * `radius` - Neighborhood radius; window side length is `2 * radius + 1`
///
/// # Returns
/// Filtered raster with the same dimensions
pub fn median_blur(image: &ArrayView2<u8>, radius: usize) -> Array2<u8> {
    let (height, width) = image.dim();
    let mut output = Array2::zeros((height, width));
    let side = 2 * radius + 1;
    let mut window = Vec::with_capacity(side * side);

    for row in 0..height {
        for col in 0..width {
            window.clear();

            for dr in -(radius as isize)..=(radius as isize) {
                for dc in -(radius as isize)..=(radius as isize) {
                    let r = (row as isize + dr).clamp(0, height as isize - 1) as usize;
                    let c = (col as isize + dc).clamp(0, width as isize - 1) as usize;
                    window.push(image[[r, c]]);
                }
            }

            window.sort_unstable();
            output[[row, col]] = window[window.len() / 2];
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_blur_removes_single_hot_pixel() {
        let mut image = Array2::from_elem((9, 9), 10u8);
        image[[4, 4]] = 255;

        let filtered = median_blur(&image.view(), 2);
        assert_eq!(filtered[[4, 4]], 10);
    }

    #[test]
    fn test_median_blur_preserves_flat_regions() {
        let image = Array2::from_elem((7, 7), 42u8);
        let filtered = median_blur(&image.view(), 2);
        assert_eq!(filtered, image);
    }

    #[test]
    fn test_median_blur_preserves_large_blob() {
        // A 5x5 bright block survives a 5x5 median: its interior pixels see a
        // majority-bright window.
        let mut image = Array2::from_elem((11, 11), 0u8);
        for row in 3..8 {
            for col in 3..8 {
                image[[row, col]] = 200;
            }
        }

        let filtered = median_blur(&image.view(), 2);
        assert_eq!(filtered[[5, 5]], 200);
    }

    #[test]
    fn test_median_blur_border_replication() {
        let mut image = Array2::from_elem((6, 6), 0u8);
        image[[0, 0]] = 255;

        let filtered = median_blur(&image.view(), 2);
        // The corner window holds 9 replicated copies of the hot pixel out of
        // 25 samples, still a minority, so the corner is suppressed.
        assert_eq!(filtered[[0, 0]], 0);
        assert_eq!(filtered[[1, 1]], 0);
    }
}

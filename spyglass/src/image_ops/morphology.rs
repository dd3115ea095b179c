//! Grayscale morphology with disk structuring elements.
//!
//! The top-hat transform implemented here isolates small bright features by
//! subtracting a morphological opening from the source: structures narrower
//! than the structuring element survive, slowly-varying background
//! illumination does not.

use ndarray::{Array2, ArrayView2};

/// Generate the pixel offsets of an elliptical (disk) structuring element.
///
/// Matches the rasterization used when the model's training maps were
/// produced: a point (dr, dc) belongs to the element when it falls inside
/// the axis-aligned ellipse with semi-axes `diameter / 2`.
///
/// # Arguments
/// * `diameter` - Element diameter in pixels; must be odd so the element has
///   a center pixel
///
/// # Returns
/// Offsets (dr, dc) relative to the element center
pub fn disk_element(diameter: usize) -> Vec<(isize, isize)> {
    assert!(diameter % 2 == 1, "structuring element diameter must be odd");
    let radius = (diameter / 2) as isize;
    let r = radius as f64;
    let mut offsets = Vec::new();

    for dr in -radius..=radius {
        for dc in -radius..=radius {
            if r == 0.0 {
                offsets.push((dr, dc));
                continue;
            }
            let norm = (dr as f64 / r).powi(2) + (dc as f64 / r).powi(2);
            if norm <= 1.0 {
                offsets.push((dr, dc));
            }
        }
    }

    offsets
}

/// Grayscale erosion: each output pixel is the minimum over the element.
///
/// Out-of-bounds neighbors are ignored, so borders erode against the pixels
/// that actually exist rather than an assumed padding value.
fn grayscale_erode(image: &ArrayView2<u8>, element: &[(isize, isize)]) -> Array2<u8> {
    morph_extremum(image, element, u8::MAX, |current, sample| sample < current)
}

/// Grayscale dilation: each output pixel is the maximum over the element.
fn grayscale_dilate(image: &ArrayView2<u8>, element: &[(isize, isize)]) -> Array2<u8> {
    morph_extremum(image, element, u8::MIN, |current, sample| sample > current)
}

fn morph_extremum(
    image: &ArrayView2<u8>,
    element: &[(isize, isize)],
    seed: u8,
    replaces: impl Fn(u8, u8) -> bool,
) -> Array2<u8> {
    let (height, width) = image.dim();
    let mut output = Array2::from_elem((height, width), seed);

    for row in 0..height {
        for col in 0..width {
            let mut extremum = seed;
            for &(dr, dc) in element {
                let r = row as isize + dr;
                let c = col as isize + dc;
                if r < 0 || c < 0 || r >= height as isize || c >= width as isize {
                    continue;
                }
                let sample = image[[r as usize, c as usize]];
                if replaces(extremum, sample) {
                    extremum = sample;
                }
            }
            output[[row, col]] = extremum;
        }
    }

    output
}

/// Morphological opening: erosion followed by dilation.
///
/// Removes bright structures smaller than the element while preserving the
/// intensity of everything larger.
pub fn grayscale_open(image: &ArrayView2<u8>, element: &[(isize, isize)]) -> Array2<u8> {
    let eroded = grayscale_erode(image, element);
    grayscale_dilate(&eroded.view(), element)
}

/// Morphological top-hat: `source - open(source)`, saturating at zero.
///
/// The result contains only bright features narrower than the structuring
/// element; broad illumination gradients are removed entirely.
///
/// # Arguments
/// * `image` - Input grayscale raster
/// * `element` - Structuring element offsets from [`disk_element`]
pub fn top_hat(image: &ArrayView2<u8>, element: &[(isize, isize)]) -> Array2<u8> {
    let opened = grayscale_open(image, element);
    let (height, width) = image.dim();

    Array2::from_shape_fn((height, width), |(row, col)| {
        image[[row, col]].saturating_sub(opened[[row, col]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_element_small() {
        // Diameter 3 -> radius 1 ellipse keeps the 4-neighborhood plus center
        let offsets = disk_element(3);
        assert!(offsets.contains(&(0, 0)));
        assert!(offsets.contains(&(-1, 0)));
        assert!(offsets.contains(&(0, 1)));
        assert!(!offsets.contains(&(-1, -1)));
        assert_eq!(offsets.len(), 5);
    }

    #[test]
    fn test_disk_element_symmetry() {
        let offsets = disk_element(35);
        for &(dr, dc) in &offsets {
            assert!(offsets.contains(&(-dr, -dc)));
            assert!(offsets.contains(&(dc, dr)));
        }
    }

    #[test]
    fn test_top_hat_flat_image_is_zero() {
        let image = Array2::from_elem((20, 20), 77u8);
        let element = disk_element(7);
        let result = top_hat(&image.view(), &element);
        assert!(result.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_top_hat_keeps_small_bright_spot() {
        let mut image = Array2::from_elem((21, 21), 20u8);
        image[[10, 10]] = 200;
        image[[10, 11]] = 200;
        image[[11, 10]] = 200;

        let element = disk_element(7);
        let result = top_hat(&image.view(), &element);

        // The spot is narrower than the element, so opening flattens it to
        // background and the difference retains the full excess.
        assert_eq!(result[[10, 10]], 180);
        assert_eq!(result[[0, 0]], 0);
    }

    #[test]
    fn test_top_hat_removes_wide_plateau() {
        let mut image = Array2::from_elem((31, 31), 10u8);
        for row in 5..26 {
            for col in 5..26 {
                image[[row, col]] = 120;
            }
        }

        let element = disk_element(7);
        let result = top_hat(&image.view(), &element);

        // Interior of a 21x21 plateau survives a diameter-7 opening untouched
        assert_eq!(result[[15, 15]], 0);
    }

    #[test]
    fn test_top_hat_removes_gradient_background() {
        // Slowly varying illumination plus one bright dot
        let mut image = Array2::from_shape_fn((41, 41), |(row, _)| (row * 2) as u8);
        image[[20, 20]] = image[[20, 20]].saturating_add(100);

        let element = disk_element(9);
        let result = top_hat(&image.view(), &element);

        // The dot stands out strongly; the pure gradient region is nearly flat
        assert!(result[[20, 20]] >= 90);
        assert!(result[[30, 30]] <= 10);
    }
}

//! Synthetic test scenes: blank fields with disks, squares and Gaussian
//! blobs drawn at known positions.

use image::{Rgb, RgbImage};

/// Create an all-black scene.
pub fn blank_scene(width: u32, height: u32) -> RgbImage {
    RgbImage::new(width, height)
}

/// Draw a filled disk. Pixels whose center lies within `radius` of the
/// given center are painted.
pub fn draw_disk(scene: &mut RgbImage, center: (f64, f64), radius: f64, color: Rgb<u8>) {
    let (width, height) = scene.dimensions();
    for y in 0..height {
        for x in 0..width {
            let dx = x as f64 - center.0;
            let dy = y as f64 - center.1;
            if (dx * dx + dy * dy).sqrt() <= radius {
                scene.put_pixel(x, y, color);
            }
        }
    }
}

/// Draw a filled axis-aligned square with the given top-left corner and
/// side length.
pub fn draw_square(scene: &mut RgbImage, top_left: (u32, u32), side: u32, color: Rgb<u8>) {
    let (width, height) = scene.dimensions();
    for y in top_left.1..(top_left.1 + side).min(height) {
        for x in top_left.0..(top_left.0 + side).min(width) {
            scene.put_pixel(x, y, color);
        }
    }
}

/// Add a circular Gaussian intensity profile, the shape of a defocused
/// point source. Values add onto the existing scene, saturating at 255.
pub fn draw_gaussian_blob(scene: &mut RgbImage, center: (f64, f64), sigma: f64, peak: f64) {
    let (width, height) = scene.dimensions();
    let reach = (4.0 * sigma).ceil() as i64;
    let cx = center.0.round() as i64;
    let cy = center.1.round() as i64;

    for y in (cy - reach).max(0)..=(cy + reach).min(height as i64 - 1) {
        for x in (cx - reach).max(0)..=(cx + reach).min(width as i64 - 1) {
            let dx = x as f64 - center.0;
            let dy = y as f64 - center.1;
            let value = peak * (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp();

            let pixel = scene.get_pixel_mut(x as u32, y as u32);
            for channel in pixel.0.iter_mut() {
                *channel = channel.saturating_add(value.round().min(255.0) as u8);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_has_expected_extent() {
        let mut scene = blank_scene(32, 32);
        draw_disk(&mut scene, (16.0, 16.0), 5.0, Rgb([200, 200, 200]));

        assert_eq!(scene.get_pixel(16, 16).0, [200, 200, 200]);
        assert_eq!(scene.get_pixel(16, 21).0, [200, 200, 200]);
        assert_eq!(scene.get_pixel(16, 22).0, [0, 0, 0]);
    }

    #[test]
    fn test_square_is_clipped_at_scene_edge() {
        let mut scene = blank_scene(16, 16);
        draw_square(&mut scene, (12, 12), 8, Rgb([100, 100, 100]));
        assert_eq!(scene.get_pixel(15, 15).0, [100, 100, 100]);
    }

    #[test]
    fn test_gaussian_blob_peaks_at_center() {
        let mut scene = blank_scene(32, 32);
        draw_gaussian_blob(&mut scene, (16.0, 16.0), 2.0, 200.0);

        let center = scene.get_pixel(16, 16).0[0];
        let off = scene.get_pixel(16, 20).0[0];
        assert_eq!(center, 200);
        assert!(off < center && off > 0);
    }
}

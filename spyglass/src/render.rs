//! Debug overlay rendering.
//!
//! Pure side artifact: outlines each candidate on a copy of the input color
//! image, keyed by predicted class when predictions are available. Nothing
//! here affects pipeline results, and the class-to-color mapping lives in
//! this module precisely so the core label set stays free of presentation
//! concerns.

use image::{Rgb, RgbImage};

use crate::class::ObjectClass;
use crate::classify::ClassificationResult;
use crate::segment::Candidate;

/// Outline color for a predicted class.
pub fn class_color(class: ObjectClass) -> Rgb<u8> {
    match class {
        ObjectClass::Star => Rgb([50, 150, 235]),
        ObjectClass::Nebula => Rgb([255, 160, 80]),
        ObjectClass::Galaxy => Rgb([255, 100, 255]),
        ObjectClass::Comet => Rgb([100, 255, 100]),
        ObjectClass::Planet => Rgb([100, 255, 255]),
        ObjectClass::Noise => Rgb([255, 100, 100]),
    }
}

/// Outline color for unclassified detections.
const DETECTION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Draw classified candidates onto a copy of the source image.
///
/// Candidates and predictions are zipped positionally; both come out of the
/// pipeline in `object_id` order.
pub fn render_classified(
    image: &RgbImage,
    candidates: &[Candidate],
    predictions: &[ClassificationResult],
) -> RgbImage {
    let mut overlay = image.clone();
    for (candidate, prediction) in candidates.iter().zip(predictions) {
        draw_boundary(&mut overlay, candidate, class_color(prediction.predicted_class));
    }
    overlay
}

/// Draw unclassified detections (scan mode) in a single color.
pub fn render_detections(image: &RgbImage, candidates: &[Candidate]) -> RgbImage {
    let mut overlay = image.clone();
    for candidate in candidates {
        draw_boundary(&mut overlay, candidate, DETECTION_COLOR);
    }
    overlay
}

/// Plot the boundary pixels plus their 4-neighbors for a two-pixel-wide
/// outline that stays visible on small objects.
fn draw_boundary(image: &mut RgbImage, candidate: &Candidate, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    for point in &candidate.boundary {
        for (dx, dy) in [(0i32, 0i32), (1, 0), (-1, 0), (0, 1), (0, -1)] {
            let x = point.x + dx;
            let y = point.y + dy;
            if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

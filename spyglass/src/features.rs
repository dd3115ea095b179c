//! Per-object feature computation.
//!
//! Each surviving candidate is reduced to a fixed-schema record of geometric
//! and photometric measurements. Geometry comes from the boundary polygon
//! (Green's theorem moments, convex hull, covariance ellipse); photometry is
//! computed over the candidate's filled mask only.
//!
//! Degenerate shapes are resolved to documented fallback values rather than
//! errors: zero perimeter gives circularity 0, zero hull area gives solidity
//! 0, boundaries shorter than five points give eccentricity 0, and a zero
//! zeroth moment falls back to the bounding-box center.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::FeatureError;
use crate::pipeline::RawImage;
use crate::segment::{Candidate, Point};

/// Axis-aligned bounding box in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

/// Object center in image coordinates (truncated moment centroid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Center {
    /// Column coordinate.
    pub x: i32,
    /// Row coordinate.
    pub y: i32,
}

/// Fixed-field feature record for one detected object.
///
/// `object_id` is dense and zero-based over the candidates surviving the
/// minimum-area filter, assigned in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectFeatures {
    /// Sequential id in discovery order, starting at 0.
    pub object_id: usize,
    /// Axis-aligned box enclosing the boundary.
    pub bounding_box: BoundingBox,
    /// Centroid from area moments, bounding-box center when degenerate.
    pub center: Center,
    /// Boundary-enclosed area in pixels.
    pub area: f64,
    /// Closed boundary arc length.
    pub perimeter: f64,
    /// `4 * pi * area / perimeter^2`; 0 when the perimeter is 0.
    pub circularity: f64,
    /// Bounding-box width over height; 0 when the height is 0.
    pub aspect_ratio: f64,
    /// Area over convex-hull area; 0 when the hull area is 0.
    pub solidity: f64,
    /// Ellipse-fit elongation in [0, 1); 0 for circles and short boundaries.
    pub eccentricity: f64,
    /// Mean grayscale intensity over the mask.
    pub mean_intensity_gray: f64,
    /// Population standard deviation of grayscale intensity over the mask.
    pub std_dev_intensity_gray: f64,
    /// Maximum grayscale intensity over the mask.
    pub peak_intensity_gray: f64,
    /// Mean red channel value over the mask.
    pub mean_r: f64,
    /// Mean green channel value over the mask.
    pub mean_g: f64,
    /// Mean blue channel value over the mask.
    pub mean_b: f64,
}

impl ObjectFeatures {
    /// Look up a numeric feature by its schema name.
    ///
    /// Returns `None` for names outside the record; the classification
    /// adapter maps those to 0 rather than failing.
    pub fn numeric_field(&self, name: &str) -> Option<f64> {
        match name {
            "area" => Some(self.area),
            "perimeter" => Some(self.perimeter),
            "circularity" => Some(self.circularity),
            "aspect_ratio" => Some(self.aspect_ratio),
            "solidity" => Some(self.solidity),
            "eccentricity" => Some(self.eccentricity),
            "mean_intensity_gray" => Some(self.mean_intensity_gray),
            "std_dev_intensity_gray" => Some(self.std_dev_intensity_gray),
            "peak_intensity_gray" => Some(self.peak_intensity_gray),
            "mean_r" => Some(self.mean_r),
            "mean_g" => Some(self.mean_g),
            "mean_b" => Some(self.mean_b),
            _ => None,
        }
    }
}

/// Raw polygon moments up to second order, from Green's theorem over the
/// closed boundary.
struct PolygonMoments {
    m00: f64,
    m10: f64,
    m01: f64,
    m20: f64,
    m02: f64,
    m11: f64,
}

fn polygon_moments(boundary: &[Point]) -> PolygonMoments {
    let mut m = PolygonMoments {
        m00: 0.0,
        m10: 0.0,
        m01: 0.0,
        m20: 0.0,
        m02: 0.0,
        m11: 0.0,
    };
    if boundary.len() < 3 {
        return m;
    }

    for (i, p0) in boundary.iter().enumerate() {
        let p1 = &boundary[(i + 1) % boundary.len()];
        let (x0, y0) = (p0.x as f64, p0.y as f64);
        let (x1, y1) = (p1.x as f64, p1.y as f64);
        let cross = x0 * y1 - x1 * y0;

        m.m00 += cross;
        m.m10 += (x0 + x1) * cross;
        m.m01 += (y0 + y1) * cross;
        m.m20 += (x0 * x0 + x0 * x1 + x1 * x1) * cross;
        m.m02 += (y0 * y0 + y0 * y1 + y1 * y1) * cross;
        m.m11 += (x0 * y1 + 2.0 * x0 * y0 + 2.0 * x1 * y1 + x1 * y0) * cross;
    }

    m.m00 /= 2.0;
    m.m10 /= 6.0;
    m.m01 /= 6.0;
    m.m20 /= 12.0;
    m.m02 /= 12.0;
    m.m11 /= 24.0;
    m
}

/// Closed boundary arc length.
fn perimeter(boundary: &[Point]) -> f64 {
    if boundary.len() < 2 {
        return 0.0;
    }
    let mut length = 0.0;
    for (i, p0) in boundary.iter().enumerate() {
        let p1 = &boundary[(i + 1) % boundary.len()];
        let dx = (p1.x - p0.x) as f64;
        let dy = (p1.y - p0.y) as f64;
        length += (dx * dx + dy * dy).sqrt();
    }
    length
}

/// Convex hull by Andrew's monotone chain.
///
/// Collinear points are dropped; degenerate inputs (all points on one line)
/// reduce to two endpoints, whose hull area is zero.
fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by(|a, b| (a.x, a.y).cmp(&(b.x, b.y)));
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let cross = |o: &Point, a: &Point, b: &Point| -> i64 {
        (a.x as i64 - o.x as i64) * (b.y as i64 - o.y as i64)
            - (a.y as i64 - o.y as i64) * (b.x as i64 - o.x as i64)
    };

    let mut lower: Vec<Point> = Vec::new();
    for point in &sorted {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], point) <= 0
        {
            lower.pop();
        }
        lower.push(*point);
    }

    let mut upper: Vec<Point> = Vec::new();
    for point in sorted.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], point) <= 0
        {
            upper.pop();
        }
        upper.push(*point);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn hull_area(points: &[Point]) -> f64 {
    let hull = convex_hull(points);
    crate::segment::signed_area(&hull).abs()
}

/// Eccentricity of the boundary polygon's covariance ellipse.
///
/// Eigenvalues of the second central moment matrix give the squared
/// semi-axes up to a common factor, so
/// `eccentricity = sqrt(1 - lambda_minor / lambda_major)`.
fn covariance_eccentricity(moments: &PolygonMoments) -> f64 {
    if moments.m00.abs() < f64::EPSILON {
        return 0.0;
    }

    let cx = moments.m10 / moments.m00;
    let cy = moments.m01 / moments.m00;
    let mu20 = moments.m20 / moments.m00 - cx * cx;
    let mu02 = moments.m02 / moments.m00 - cy * cy;
    let mu11 = moments.m11 / moments.m00 - cx * cy;

    let sum = mu20 + mu02;
    let diff = mu20 - mu02;
    let discriminant = (4.0 * mu11 * mu11 + diff * diff).sqrt();
    let lambda_major = (sum + discriminant) / 2.0;
    let lambda_minor = (sum - discriminant) / 2.0;

    if lambda_major < f64::EPSILON {
        return 0.0;
    }

    (1.0 - (lambda_minor / lambda_major).clamp(0.0, 1.0)).sqrt()
}

/// Compute the feature record for one candidate.
///
/// Always succeeds for candidates produced by the segmenter; the error
/// variants guard the public API against hand-built candidates that violate
/// the boundary contract (empty boundary, empty mask, box outside the
/// image).
pub fn extract(
    candidate: &Candidate,
    raw: &RawImage,
    object_id: usize,
) -> Result<ObjectFeatures, FeatureError> {
    if candidate.boundary.is_empty() {
        return Err(FeatureError::EmptyBoundary { object_id });
    }

    let (height, width) = raw.gray().dim();
    let (box_x, box_y, box_w, box_h) = candidate.bounding_box();
    if box_y + box_h > height || box_x + box_w > width {
        return Err(FeatureError::OutOfBounds {
            object_id,
            width,
            height,
        });
    }

    let moments = polygon_moments(&candidate.boundary);
    let area = moments.m00.abs();
    let perimeter = perimeter(&candidate.boundary);

    let center = if moments.m00.abs() < f64::EPSILON {
        Center {
            x: (box_x + box_w / 2) as i32,
            y: (box_y + box_h / 2) as i32,
        }
    } else {
        Center {
            x: (moments.m10 / moments.m00) as i32,
            y: (moments.m01 / moments.m00) as i32,
        }
    };

    let circularity = if perimeter > 0.0 {
        4.0 * PI * area / (perimeter * perimeter)
    } else {
        0.0
    };

    let aspect_ratio = if box_h > 0 {
        box_w as f64 / box_h as f64
    } else {
        0.0
    };

    let hull_area = hull_area(&candidate.boundary);
    let solidity = if hull_area > 0.0 { area / hull_area } else { 0.0 };

    let eccentricity = if candidate.boundary.len() >= 5 {
        covariance_eccentricity(&moments)
    } else {
        0.0
    };

    // Photometry over the mask only
    let gray = raw.gray();
    let rgb = raw.rgb();
    let mut count = 0usize;
    let mut sum_gray = 0.0;
    let mut peak = 0.0f64;
    let mut sum_r = 0.0;
    let mut sum_g = 0.0;
    let mut sum_b = 0.0;

    for ((local_row, local_col), &inside) in candidate.mask.indexed_iter() {
        if !inside {
            continue;
        }
        let row = candidate.min_row + local_row;
        let col = candidate.min_col + local_col;
        let value = gray[[row, col]] as f64;
        sum_gray += value;
        peak = peak.max(value);
        count += 1;

        let pixel = rgb.get_pixel(col as u32, row as u32).0;
        sum_r += pixel[0] as f64;
        sum_g += pixel[1] as f64;
        sum_b += pixel[2] as f64;
    }

    if count == 0 {
        return Err(FeatureError::EmptyMask { object_id });
    }

    let mean_gray = sum_gray / count as f64;
    let mut variance = 0.0;
    for ((local_row, local_col), &inside) in candidate.mask.indexed_iter() {
        if inside {
            let row = candidate.min_row + local_row;
            let col = candidate.min_col + local_col;
            let delta = gray[[row, col]] as f64 - mean_gray;
            variance += delta * delta;
        }
    }
    variance /= count as f64;

    Ok(ObjectFeatures {
        object_id,
        bounding_box: BoundingBox {
            x: box_x as u32,
            y: box_y as u32,
            w: box_w as u32,
            h: box_h as u32,
        },
        center,
        area,
        perimeter,
        circularity,
        aspect_ratio,
        solidity,
        eccentricity,
        mean_intensity_gray: mean_gray,
        std_dev_intensity_gray: variance.sqrt(),
        peak_intensity_gray: peak,
        mean_r: sum_r / count as f64,
        mean_g: sum_g / count as f64,
        mean_b: sum_b / count as f64,
    })
}

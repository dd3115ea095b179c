//! Candidate segmentation: threshold the processed map and extract outer
//! object boundaries.
//!
//! # Algorithm
//!
//! 1. **Binary threshold**: processed-map values strictly above the detection
//!    threshold become foreground.
//! 2. **Connected components**: two-pass labeling with union-find,
//!    8-connectivity, labels assigned in raster-scan discovery order.
//! 3. **Boundary tracing**: the outer boundary of each component is traced
//!    clockwise (Moore neighbor tracing with Jacob's stopping criterion).
//!    Holes inside a blob are never separate candidates.
//! 4. **Noise floor**: boundaries enclosing less than the minimum area are
//!    discarded. This floor is part of the trained-model contract, not a
//!    caller tunable.
//!
//! Candidate order follows discovery order, which downstream stages rely on
//! for dense `object_id` assignment.

use ndarray::{Array2, ArrayView2};
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::preprocess::ProcessedMap;

/// Integer pixel coordinate on a traced boundary. `x` is the column, `y` the
/// row, matching the serialized output convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// Column coordinate.
    pub x: i32,
    /// Row coordinate.
    pub y: i32,
}

/// A connected bright region: its ordered outer boundary plus the filled
/// binary mask over its bounding box.
///
/// Ephemeral: exists only between segmentation and feature extraction.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Closed outer boundary in clockwise order (closing edge implied).
    pub boundary: Vec<Point>,
    /// Bounding-box top row in image coordinates.
    pub min_row: usize,
    /// Bounding-box left column in image coordinates.
    pub min_col: usize,
    /// Binary mask of the enclosed region, bounding-box local, polygon-filled
    /// so interior holes belong to the candidate.
    pub mask: Array2<bool>,
    /// Boundary-enclosed area in pixels (shoelace over the boundary polygon).
    pub area: f64,
}

impl Candidate {
    /// Bounding box as (x, y, w, h) in image coordinates.
    pub fn bounding_box(&self) -> (usize, usize, usize, usize) {
        let (height, width) = self.mask.dim();
        (self.min_col, self.min_row, width, height)
    }
}

/// Threshold the processed map: strictly greater than `threshold` is
/// foreground.
pub fn apply_threshold(map: &ArrayView2<u8>, threshold: u8) -> Array2<bool> {
    map.mapv(|value| value > threshold)
}

/// Find the root label in a disjoint-set (union-find) structure, compressing
/// the path as it goes.
fn find_root(parents: &mut [usize], label: usize) -> usize {
    let mut current = label;
    while current != parents[current] {
        parents[current] = parents[parents[current]];
        current = parents[current];
    }
    current
}

/// Union two labels; the smaller root becomes the parent so component roots
/// stay in discovery order.
fn union_labels(parents: &mut [usize], label1: usize, label2: usize) {
    let root1 = find_root(parents, label1);
    let root2 = find_root(parents, label2);
    if root1 != root2 {
        if root1 < root2 {
            parents[root2] = root1;
        } else {
            parents[root1] = root2;
        }
    }
}

/// Connected-component labeling, two passes with union-find, 8-connectivity.
///
/// Returns the label raster (0 = background, components numbered from 1 in
/// raster-scan discovery order), the component count, and each component's
/// first raster pixel.
pub fn connected_components(
    binary: &ArrayView2<bool>,
) -> (Array2<usize>, usize, Vec<(usize, usize)>) {
    let (height, width) = binary.dim();
    let mut labels = Array2::zeros((height, width));
    let mut parents = vec![0usize];
    let mut label_count = 0usize;

    // First pass: provisional labels, equivalences for all four already-seen
    // neighbors (west, north-west, north, north-east)
    for row in 0..height {
        for col in 0..width {
            if !binary[[row, col]] {
                continue;
            }

            let mut neighbor_labels: [usize; 4] = [0; 4];
            let mut n = 0;
            if col > 0 && labels[[row, col - 1]] > 0 {
                neighbor_labels[n] = labels[[row, col - 1]];
                n += 1;
            }
            if row > 0 {
                if col > 0 && labels[[row - 1, col - 1]] > 0 {
                    neighbor_labels[n] = labels[[row - 1, col - 1]];
                    n += 1;
                }
                if labels[[row - 1, col]] > 0 {
                    neighbor_labels[n] = labels[[row - 1, col]];
                    n += 1;
                }
                if col + 1 < width && labels[[row - 1, col + 1]] > 0 {
                    neighbor_labels[n] = labels[[row - 1, col + 1]];
                    n += 1;
                }
            }

            if n == 0 {
                label_count += 1;
                labels[[row, col]] = label_count;
                parents.push(label_count);
            } else {
                let min_label = *neighbor_labels[..n].iter().min().unwrap();
                labels[[row, col]] = min_label;
                for &neighbor in &neighbor_labels[..n] {
                    if neighbor != min_label {
                        union_labels(&mut parents, min_label, neighbor);
                    }
                }
            }
        }
    }

    // Flatten the equivalence forest
    for label in 1..parents.len() {
        find_root(&mut parents, label);
    }

    // Consecutive final labels; the root of a component is its smallest
    // provisional label, which was created at the component's first raster
    // pixel, so index order here preserves discovery order
    let mut relabel = vec![0usize; parents.len()];
    let mut next = 0usize;
    for label in 1..parents.len() {
        let root = parents[label];
        if relabel[root] == 0 {
            next += 1;
            relabel[root] = next;
        }
        relabel[label] = relabel[root];
    }

    // Second pass: apply final labels, record first raster pixel per label
    let mut firsts = vec![(0usize, 0usize); next + 1];
    let mut seen = vec![false; next + 1];
    for row in 0..height {
        for col in 0..width {
            let provisional = labels[[row, col]];
            if provisional > 0 {
                let label = relabel[provisional];
                labels[[row, col]] = label;
                if !seen[label] {
                    seen[label] = true;
                    firsts[label] = (row, col);
                }
            }
        }
    }

    firsts.remove(0);
    (labels, next, firsts)
}

/// Clockwise 8-neighborhood offsets (dr, dc), starting north.
const NEIGHBORS: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Trace the outer boundary of one labeled component.
///
/// Moore neighbor tracing, clockwise, starting at the component's first
/// raster pixel with the backtrack position to its west (guaranteed
/// background by raster order). Terminates on Jacob's stopping criterion:
/// re-entering the start pixel from the same backtrack position.
///
/// Thin one-pixel structures legitimately revisit pixels; the boundary is a
/// closed pixel walk, not a simple polygon.
fn trace_boundary(labels: &ArrayView2<usize>, target: usize, start: (usize, usize)) -> Vec<Point> {
    let (height, width) = labels.dim();
    let is_target = |r: isize, c: isize| {
        r >= 0
            && c >= 0
            && r < height as isize
            && c < width as isize
            && labels[[r as usize, c as usize]] == target
    };

    let start = (start.0 as isize, start.1 as isize);
    let mut boundary = vec![Point {
        x: start.1 as i32,
        y: start.0 as i32,
    }];

    let mut current = start;
    let mut backtrack = (start.0, start.1 - 1);
    let initial = (current, backtrack);
    let step_cap = 8 * labels.len() + 8;

    loop {
        let backtrack_dir = NEIGHBORS
            .iter()
            .position(|&(dr, dc)| (current.0 + dr, current.1 + dc) == backtrack)
            .expect("backtrack position is always adjacent to the current pixel");

        let mut advanced = false;
        for offset in 1..=8 {
            let dir = (backtrack_dir + offset) % 8;
            let next = (current.0 + NEIGHBORS[dir].0, current.1 + NEIGHBORS[dir].1);
            if is_target(next.0, next.1) {
                // The neighbor scanned just before this one is background and
                // becomes the new backtrack position
                let before = (dir + 7) % 8;
                backtrack = (
                    current.0 + NEIGHBORS[before].0,
                    current.1 + NEIGHBORS[before].1,
                );
                current = next;
                advanced = true;
                break;
            }
        }

        if !advanced {
            // Isolated single pixel
            break;
        }
        if (current, backtrack) == initial {
            break;
        }

        boundary.push(Point {
            x: current.1 as i32,
            y: current.0 as i32,
        });

        if boundary.len() > step_cap {
            warn!(target_label = target, "boundary trace exceeded step cap");
            break;
        }
    }

    boundary
}

/// Signed area of the boundary polygon (shoelace formula). Negative for
/// counter-clockwise traversal in image coordinates.
pub fn signed_area(boundary: &[Point]) -> f64 {
    if boundary.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0.0;
    for (i, p0) in boundary.iter().enumerate() {
        let p1 = &boundary[(i + 1) % boundary.len()];
        doubled += p0.x as f64 * p1.y as f64 - p1.x as f64 * p0.y as f64;
    }
    doubled / 2.0
}

/// Fill the boundary polygon into a bounding-box-local mask.
///
/// Even-odd scanline fill over pixel centers, with the boundary pixels
/// themselves always included, mirroring a filled contour draw.
fn polygon_mask(
    boundary: &[Point],
    min_row: usize,
    min_col: usize,
    height: usize,
    width: usize,
) -> Array2<bool> {
    let mut mask = Array2::from_elem((height, width), false);
    let n = boundary.len();

    if n >= 3 {
        let mut crossings: Vec<f64> = Vec::new();
        for local_row in 0..height {
            let y = (min_row + local_row) as f64;
            crossings.clear();

            for (i, p0) in boundary.iter().enumerate() {
                let p1 = &boundary[(i + 1) % n];
                let (y0, y1) = (p0.y as f64, p1.y as f64);
                // Half-open rule so vertices on the scanline count once
                if (y0 <= y && y < y1) || (y1 <= y && y < y0) {
                    let t = (y - y0) / (y1 - y0);
                    crossings.push(p0.x as f64 + t * (p1.x as f64 - p0.x as f64));
                }
            }

            crossings.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for pair in crossings.chunks_exact(2) {
                let from = pair[0].ceil() as isize;
                let to = pair[1].floor() as isize;
                for col in from..=to {
                    if col >= min_col as isize && col < (min_col + width) as isize {
                        mask[[local_row, col as usize - min_col]] = true;
                    }
                }
            }
        }
    }

    for point in boundary {
        let row = point.y as usize;
        let col = point.x as usize;
        if row >= min_row && col >= min_col {
            let (lr, lc) = (row - min_row, col - min_col);
            if lr < height && lc < width {
                mask[[lr, lc]] = true;
            }
        }
    }

    mask
}

/// Extract candidate objects from the processed map.
///
/// Returns candidates in raster-scan discovery order; an empty vector is the
/// valid outcome for a map with no foreground.
pub fn segment(map: &ProcessedMap, config: &PipelineConfig) -> Vec<Candidate> {
    let binary = apply_threshold(&map.0.view(), config.detection_threshold);
    let (labels, count, firsts) = connected_components(&binary.view());

    let mut candidates = Vec::new();
    for (index, &first) in firsts.iter().enumerate() {
        let label = index + 1;
        let boundary = trace_boundary(&labels.view(), label, first);
        let area = signed_area(&boundary).abs();

        if area < config.min_area {
            continue;
        }

        let min_row = boundary.iter().map(|p| p.y).min().unwrap() as usize;
        let max_row = boundary.iter().map(|p| p.y).max().unwrap() as usize;
        let min_col = boundary.iter().map(|p| p.x).min().unwrap() as usize;
        let max_col = boundary.iter().map(|p| p.x).max().unwrap() as usize;
        let height = max_row - min_row + 1;
        let width = max_col - min_col + 1;

        let mask = polygon_mask(&boundary, min_row, min_col, height, width);

        candidates.push(Candidate {
            boundary,
            min_row,
            min_col,
            mask,
            area,
        });
    }

    debug!(
        components = count,
        candidates = candidates.len(),
        "segmentation complete"
    );

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a binary image from rows of 0/1 literals.
    fn binary_image(pattern: &[&[u8]]) -> Array2<bool> {
        let height = pattern.len();
        let width = pattern[0].len();
        Array2::from_shape_fn((height, width), |(row, col)| pattern[row][col] != 0)
    }

    fn map_from(pattern: &[&[u8]], level: u8) -> ProcessedMap {
        let height = pattern.len();
        let width = pattern[0].len();
        ProcessedMap(Array2::from_shape_fn((height, width), |(row, col)| {
            if pattern[row][col] != 0 {
                level
            } else {
                0
            }
        }))
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        let map = Array2::from_shape_fn((1, 3), |(_, col)| [14u8, 15, 16][col]);
        let binary = apply_threshold(&map.view(), 15);
        assert!(!binary[[0, 0]]);
        assert!(!binary[[0, 1]]);
        assert!(binary[[0, 2]]);
    }

    #[test]
    fn test_components_diagonal_pixels_connect() {
        // 8-connectivity joins diagonal neighbors into one component
        let image = binary_image(&[
            &[1, 0, 0],
            &[0, 1, 0],
            &[0, 0, 1],
        ]);
        let (_, count, _) = connected_components(&image.view());
        assert_eq!(count, 1);
    }

    #[test]
    fn test_components_discovery_order() {
        let image = binary_image(&[
            &[0, 0, 0, 1, 1],
            &[1, 1, 0, 1, 1],
            &[1, 1, 0, 0, 0],
            &[0, 0, 0, 1, 1],
        ]);
        let (labels, count, firsts) = connected_components(&image.view());
        assert_eq!(count, 3);
        // First raster pixel decides numbering
        assert_eq!(firsts[0], (0, 3));
        assert_eq!(firsts[1], (1, 0));
        assert_eq!(firsts[2], (3, 3));
        assert_eq!(labels[[0, 3]], 1);
        assert_eq!(labels[[1, 0]], 2);
        assert_eq!(labels[[3, 3]], 3);
    }

    #[test]
    fn test_components_u_shape_merges() {
        let image = binary_image(&[
            &[1, 0, 1],
            &[1, 0, 1],
            &[1, 1, 1],
        ]);
        let (_, count, _) = connected_components(&image.view());
        assert_eq!(count, 1);
    }

    #[test]
    fn test_trace_boundary_single_pixel() {
        let image = binary_image(&[
            &[0, 0, 0],
            &[0, 1, 0],
            &[0, 0, 0],
        ]);
        let (labels, _, firsts) = connected_components(&image.view());
        let boundary = trace_boundary(&labels.view(), 1, firsts[0]);
        assert_eq!(boundary, vec![Point { x: 1, y: 1 }]);
    }

    #[test]
    fn test_trace_boundary_square_block() {
        let image = binary_image(&[
            &[0, 0, 0, 0, 0],
            &[0, 1, 1, 1, 0],
            &[0, 1, 1, 1, 0],
            &[0, 1, 1, 1, 0],
            &[0, 0, 0, 0, 0],
        ]);
        let (labels, _, firsts) = connected_components(&image.view());
        let boundary = trace_boundary(&labels.view(), 1, firsts[0]);

        // Perimeter of a 3x3 block is its 8 outer pixels
        assert_eq!(boundary.len(), 8);
        assert!(!boundary.contains(&Point { x: 2, y: 2 }));
        assert!((signed_area(&boundary).abs() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_empty_map_returns_no_candidates() {
        let map = ProcessedMap(Array2::zeros((16, 16)));
        let candidates = segment(&map, &PipelineConfig::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_segment_discards_noise_sized_regions() {
        // 3x3 block encloses area 4.0, below the floor of 5
        let map = map_from(
            &[
                &[0, 0, 0, 0, 0],
                &[0, 1, 1, 1, 0],
                &[0, 1, 1, 1, 0],
                &[0, 1, 1, 1, 0],
                &[0, 0, 0, 0, 0],
            ],
            200,
        );
        let candidates = segment(&map, &PipelineConfig::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_segment_keeps_sufficient_regions() {
        // 4x4 block encloses area 9.0
        let map = map_from(
            &[
                &[0, 0, 0, 0, 0, 0],
                &[0, 1, 1, 1, 1, 0],
                &[0, 1, 1, 1, 1, 0],
                &[0, 1, 1, 1, 1, 0],
                &[0, 1, 1, 1, 1, 0],
                &[0, 0, 0, 0, 0, 0],
            ],
            200,
        );
        let candidates = segment(&map, &PipelineConfig::default());
        assert_eq!(candidates.len(), 1);

        let candidate = &candidates[0];
        assert_eq!(candidate.bounding_box(), (1, 1, 4, 4));
        assert!((candidate.area - 9.0).abs() < 1e-12);

        // Mask covers the full block
        assert!(candidate.mask.iter().all(|&m| m));
    }

    #[test]
    fn test_segment_hole_is_not_a_candidate_and_gets_filled() {
        // Ring with an interior hole: one candidate, mask includes the hole
        let map = map_from(
            &[
                &[0, 0, 0, 0, 0, 0, 0],
                &[0, 1, 1, 1, 1, 1, 0],
                &[0, 1, 0, 0, 0, 1, 0],
                &[0, 1, 0, 0, 0, 1, 0],
                &[0, 1, 0, 0, 0, 1, 0],
                &[0, 1, 1, 1, 1, 1, 0],
                &[0, 0, 0, 0, 0, 0, 0],
            ],
            200,
        );
        let candidates = segment(&map, &PipelineConfig::default());
        assert_eq!(candidates.len(), 1);
        // Hole center, image pixel (3,3), sits inside the filled mask
        assert!(candidates[0].mask[[2, 2]]);
        assert!((candidates[0].area - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_candidate_order_matches_raster_scan() {
        let map = map_from(
            &[
                &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                &[0, 0, 0, 0, 0, 0, 1, 1, 1, 1],
                &[0, 0, 0, 0, 0, 0, 1, 1, 1, 1],
                &[0, 1, 1, 1, 1, 0, 1, 1, 1, 1],
                &[0, 1, 1, 1, 1, 0, 1, 1, 1, 1],
                &[0, 1, 1, 1, 1, 0, 0, 0, 0, 0],
                &[0, 1, 1, 1, 1, 0, 0, 0, 0, 0],
                &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            ],
            200,
        );
        let candidates = segment(&map, &PipelineConfig::default());
        assert_eq!(candidates.len(), 2);
        // The upper-right block is discovered first
        assert_eq!(candidates[0].bounding_box().1, 1);
        assert_eq!(candidates[1].bounding_box().1, 3);
    }
}

//! Image preprocessing: normalize a raw color frame into a contrast-enhanced
//! map that emphasizes small bright blobs.
//!
//! # Processing chain
//!
//! 1. **Median blur** (5x5) suppresses shot noise without destroying blobs
//!    a few pixels across.
//! 2. **CLAHE** (clip 2.0, 8x8 tiles) boosts faint structure locally.
//! 3. **Top-hat** (elliptical element, diameter 35) removes slowly-varying
//!    background illumination, leaving small bright features.
//!
//! The chain is a pure transform: it always succeeds on a valid raster and
//! touches no state outside its inputs.

use ndarray::Array2;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::image_ops::{clahe, disk_element, median_blur, top_hat};
use crate::pipeline::RawImage;

/// Contrast-enhanced single-channel map, same dimensions as the source
/// grayscale raster. Consumed only by the segmenter.
#[derive(Debug, Clone)]
pub struct ProcessedMap(pub Array2<u8>);

impl ProcessedMap {
    /// Map dimensions as (height, width).
    pub fn dim(&self) -> (usize, usize) {
        self.0.dim()
    }
}

/// Run the preprocessing chain over a raw image.
///
/// Constants come from [`PipelineConfig`]; the defaults are the values the
/// classifier was trained against.
pub fn preprocess(raw: &RawImage, config: &PipelineConfig) -> ProcessedMap {
    let blurred = median_blur(&raw.gray().view(), config.median_radius);
    let enhanced = clahe(&blurred.view(), config.clahe_clip_limit, config.clahe_tile_grid);

    let element = disk_element(config.tophat_diameter);
    let map = top_hat(&enhanced.view(), &element);

    debug!(
        height = map.dim().0,
        width = map.dim().1,
        "preprocessing complete"
    );

    ProcessedMap(map)
}

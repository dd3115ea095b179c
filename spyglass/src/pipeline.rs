//! Pipeline orchestration: preprocess, segment, extract, classify,
//! aggregate.
//!
//! A [`Pipeline`] owns its configuration and an optional shared model
//! context; it holds no other state, so one instance can serve many images
//! and independent invocations may run concurrently. Each invocation owns
//! its [`RawImage`] and everything derived from it.

use image::RgbImage;
use ndarray::Array2;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aggregate::{aggregate, PipelineOutput, SkippedObject};
use crate::classify::classify;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::features::{extract, ObjectFeatures};
use crate::image_ops::rgb_to_gray;
use crate::model::ModelContext;
use crate::preprocess::preprocess;
use crate::segment::{segment, Candidate};

/// A decoded color image plus its derived grayscale raster.
///
/// Immutable once constructed; owned exclusively by one pipeline
/// invocation. Decoding failures are the caller's concern and never reach
/// the pipeline.
#[derive(Debug, Clone)]
pub struct RawImage {
    rgb: RgbImage,
    gray: Array2<u8>,
}

impl RawImage {
    /// Derive the grayscale raster and take ownership of the color image.
    pub fn new(rgb: RgbImage) -> Self {
        let gray = rgb_to_gray(&rgb);
        Self { rgb, gray }
    }

    /// The decoded color raster.
    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// The derived grayscale raster, (height, width) indexed.
    pub fn gray(&self) -> &Array2<u8> {
        &self.gray
    }
}

/// Detection-stage output: candidates with their feature records, before
/// classification.
#[derive(Debug)]
pub struct Detection {
    /// Surviving candidates in discovery order.
    pub candidates: Vec<Candidate>,
    /// Feature records, `object_id` order, minus isolated failures.
    pub features: Vec<ObjectFeatures>,
    /// Candidates dropped by per-candidate isolation.
    pub skipped: Vec<SkippedObject>,
}

/// The detection-and-classification pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    model: Option<Arc<ModelContext>>,
}

impl Pipeline {
    /// Detection-only pipeline; [`Pipeline::process`] will refuse to run
    /// until a model context is attached.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Pipeline with a shared model context for classification.
    pub fn with_model(config: PipelineConfig, model: Arc<ModelContext>) -> Self {
        Self {
            config,
            model: Some(model),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run preprocessing, segmentation and feature extraction.
    ///
    /// `object_id` is assigned densely in discovery order before
    /// extraction. Extraction runs per candidate in parallel and is
    /// isolated: a failing candidate becomes a [`SkippedObject`] instead of
    /// aborting the batch.
    pub fn detect(&self, raw: &RawImage) -> Detection {
        let map = preprocess(raw, &self.config);
        let candidates = segment(&map, &self.config);

        let outcomes: Vec<Result<ObjectFeatures, _>> = candidates
            .par_iter()
            .enumerate()
            .map(|(object_id, candidate)| extract(candidate, raw, object_id))
            .collect();

        let mut features = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (object_id, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(record) => features.push(record),
                Err(error) => {
                    warn!(%error, "skipping candidate");
                    skipped.push(SkippedObject {
                        object_id,
                        reason: error.to_string(),
                    });
                }
            }
        }

        Detection {
            candidates,
            features,
            skipped,
        }
    }

    /// Run the full pipeline on one image.
    ///
    /// Zero candidates is a valid outcome: the result is a well-formed
    /// empty output and the classifier is never invoked.
    pub fn process(&self, raw: &RawImage) -> Result<PipelineOutput, PipelineError> {
        let model = self.model.as_ref().ok_or(PipelineError::ModelMissing)?;
        let detection = self.detect(raw);

        if detection.features.is_empty() {
            info!("no candidates survived segmentation");
            return Ok(aggregate(&[], Vec::new(), detection.skipped));
        }

        let predictions = classify(&detection.features, model)?;
        let output = aggregate(&detection.features, predictions, detection.skipped);

        info!(
            objects = output.object_count,
            skipped = output.skipped.len(),
            "pipeline complete"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn blob_image(size: u32, blobs: &[(u32, u32, u32)]) -> RgbImage {
        let mut rgb = RgbImage::new(size, size);
        for &(cx, cy, radius) in blobs {
            for (x, y, pixel) in rgb.enumerate_pixels_mut() {
                let dx = x as f64 - cx as f64;
                let dy = y as f64 - cy as f64;
                if (dx * dx + dy * dy).sqrt() <= radius as f64 {
                    *pixel = Rgb([230, 230, 230]);
                }
            }
        }
        rgb
    }

    #[test]
    fn test_detect_assigns_dense_object_ids() {
        let raw = RawImage::new(blob_image(96, &[(20, 20, 5), (70, 30, 6), (40, 70, 7)]));
        let pipeline = Pipeline::new(PipelineConfig::default());

        let detection = pipeline.detect(&raw);
        assert_eq!(detection.features.len(), detection.candidates.len());
        for (expected, record) in detection.features.iter().enumerate() {
            assert_eq!(record.object_id, expected);
        }
        assert!(detection.skipped.is_empty());
    }

    #[test]
    fn test_detect_is_deterministic() {
        let raw = RawImage::new(blob_image(96, &[(30, 30, 6), (60, 60, 8)]));
        let pipeline = Pipeline::new(PipelineConfig::default());

        let first = pipeline.detect(&raw);
        let second = pipeline.detect(&raw);
        assert_eq!(first.features, second.features);
    }

    #[test]
    fn test_process_without_model_is_an_error() {
        let raw = RawImage::new(blob_image(64, &[]));
        let pipeline = Pipeline::new(PipelineConfig::default());
        assert!(matches!(
            pipeline.process(&raw),
            Err(PipelineError::ModelMissing)
        ));
    }
}

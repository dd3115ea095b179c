//! SPYGLASS - detection and classification of bright objects in
//! astronomical images.
//!
//! Processes one image at a time through a strictly sequential pipeline:
//! preprocessing -> segmentation -> feature extraction -> classification ->
//! aggregation. The trained model artifacts are loaded once into an
//! immutable [`ModelContext`] and shared across invocations; everything
//! else lives and dies with a single image.

pub mod aggregate;
pub mod class;
pub mod classify;
pub mod config;
pub mod error;
pub mod features;
pub mod image_ops;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod render;
pub mod segment;

// Re-export the types most callers need
pub use crate::aggregate::{PipelineOutput, SkippedObject};
pub use crate::class::ObjectClass;
pub use crate::classify::ClassificationResult;
pub use crate::config::PipelineConfig;
pub use crate::error::{ClassifyError, FeatureError, ModelError, PipelineError};
pub use crate::features::{BoundingBox, Center, ObjectFeatures};
pub use crate::model::ModelContext;
pub use crate::pipeline::{Detection, Pipeline, RawImage};
pub use crate::preprocess::ProcessedMap;
pub use crate::segment::Candidate;

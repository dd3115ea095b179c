use thiserror::Error;

/// Errors produced while loading or validating model artifacts.
#[derive(Error, Debug)]
pub enum ModelError {
    /// An artifact file could not be read.
    #[error("failed to read model artifact {path}: {source}")]
    ArtifactRead {
        /// Path of the artifact file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An artifact file could not be parsed.
    #[error("failed to parse model artifact {path}: {source}")]
    ArtifactParse {
        /// Path of the artifact file.
        path: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The classifier does not agree with the feature schema.
    #[error("classifier expects {classifier} features but schema lists {schema}")]
    FeatureCountMismatch {
        /// Feature count the classifier was built for.
        classifier: usize,
        /// Number of entries in the feature-name schema.
        schema: usize,
    },

    /// The classifier does not agree with the class-name list.
    #[error("classifier produces {classifier} classes but {names} class names were provided")]
    ClassCountMismatch {
        /// Class count the classifier was built for.
        classifier: usize,
        /// Number of class names provided.
        names: usize,
    },

    /// The imputer does not cover the feature schema.
    #[error("imputer covers {imputer} columns but schema lists {schema}")]
    ImputerWidthMismatch {
        /// Columns the imputer was fitted on.
        imputer: usize,
        /// Number of entries in the feature-name schema.
        schema: usize,
    },

    /// A decision tree references nodes or features out of range.
    #[error("malformed decision tree {tree}: {detail}")]
    MalformedTree {
        /// Index of the offending tree.
        tree: usize,
        /// Description of the structural problem.
        detail: String,
    },
}

/// Errors produced when translating feature records into predictions.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// No feature rows were supplied; callers must short-circuit empty
    /// candidate lists before invoking the adapter.
    #[error("cannot classify an empty feature matrix")]
    EmptyFeatureMatrix,

    /// The feature matrix width does not match the model schema.
    #[error("feature matrix has {got} columns, model schema expects {expected}")]
    SchemaMismatch {
        /// Column count the model expects.
        expected: usize,
        /// Column count that was supplied.
        got: usize,
    },
}

/// Errors produced during per-candidate feature extraction.
///
/// These indicate a broken caller contract rather than a degenerate shape;
/// geometric edge cases (zero perimeter, zero hull area, short boundaries)
/// are resolved to documented fallback values instead.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// Candidate carries no boundary points.
    #[error("candidate {object_id} has an empty boundary")]
    EmptyBoundary {
        /// Discovery-order id of the candidate.
        object_id: usize,
    },

    /// Candidate mask holds no pixels to sample intensities from.
    #[error("candidate {object_id} has an empty mask")]
    EmptyMask {
        /// Discovery-order id of the candidate.
        object_id: usize,
    },

    /// Candidate bounding box extends past the image.
    #[error("candidate {object_id} bounding box exceeds image dimensions ({width}x{height})")]
    OutOfBounds {
        /// Discovery-order id of the candidate.
        object_id: usize,
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
    },
}

/// Top-level pipeline failure.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Classification was requested but no model context is attached.
    #[error("pipeline has no model context attached")]
    ModelMissing,

    /// The classification adapter failed for the whole batch.
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

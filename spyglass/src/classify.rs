//! Classification adapter: align feature records to the model schema and
//! turn them into labeled, confidence-scored predictions.
//!
//! Alignment is tolerant by contract: a schema column with no counterpart in
//! the feature record is filled with 0, never raised. The imputation step
//! then resolves any remaining non-finite values, so the classifier always
//! receives a fully populated matrix.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::class::ObjectClass;
use crate::error::ClassifyError;
use crate::features::{Center, ObjectFeatures};
use crate::model::ModelContext;

/// One labeled prediction, in `object_id` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Id of the object this prediction belongs to.
    pub object_id: usize,
    /// Predicted class from the model's closed label set.
    pub predicted_class: ObjectClass,
    /// Object center carried through from feature extraction.
    pub center: Center,
    /// Probability of the predicted class, absent when the model cannot
    /// produce probabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Align feature records to the model schema and classify them.
///
/// Callers must short-circuit empty candidate lists before invoking this;
/// an empty `features` slice is the one alignment failure
/// ([`ClassifyError::EmptyFeatureMatrix`]).
pub fn classify(
    features: &[ObjectFeatures],
    model: &ModelContext,
) -> Result<Vec<ClassificationResult>, ClassifyError> {
    if features.is_empty() {
        return Err(ClassifyError::EmptyFeatureMatrix);
    }

    let schema = model.feature_names();
    let mut matrix = Array2::zeros((features.len(), schema.len()));
    for (row, record) in features.iter().enumerate() {
        for (column, name) in schema.iter().enumerate() {
            matrix[[row, column]] = record.numeric_field(name).unwrap_or(0.0);
        }
    }

    model.imputer().transform(&mut matrix)?;

    let indices = model.classifier().predict(&matrix.view())?;
    let probabilities = model.classifier().predict_proba(&matrix.view());
    if probabilities.is_none() {
        debug!("classifier provides no probabilities, emitting label-only predictions");
    }

    let class_names = model.class_names();
    let results = features
        .iter()
        .zip(indices)
        .enumerate()
        .map(|(row, (record, index))| {
            let predicted_class = class_names[index];
            // Confidence is looked up by matching the predicted label
            // against the model's class ordering
            let confidence = probabilities.as_ref().and_then(|p| {
                class_names
                    .iter()
                    .position(|&name| name == predicted_class)
                    .map(|class| round4(p[[row, class]]))
            });

            ClassificationResult {
                object_id: record.object_id,
                predicted_class,
                center: record.center,
                confidence,
            }
        })
        .collect();

    Ok(results)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

//! Final output assembly: per-object results plus per-class tallies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::class::ObjectClass;
use crate::classify::ClassificationResult;
use crate::features::ObjectFeatures;

/// An object dropped by per-candidate isolation, with the reason it was
/// skipped. Present so one degenerate candidate never silently shrinks the
/// result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedObject {
    /// Discovery-order id the object would have carried.
    pub object_id: usize,
    /// Human-readable extraction failure.
    pub reason: String,
}

/// Structured output of one pipeline invocation.
///
/// Serializes to the wire shape `{object_count, class_counts, predictions}`
/// with `skipped` present only when isolation dropped something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineOutput {
    /// Number of classified objects.
    pub object_count: usize,
    /// Label -> occurrence count over the predictions.
    pub class_counts: BTreeMap<ObjectClass, usize>,
    /// One result per object, preserving `object_id` order.
    pub predictions: Vec<ClassificationResult>,
    /// Objects dropped by per-candidate isolation.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped: Vec<SkippedObject>,
}

/// Assemble the final output.
///
/// With no surviving candidates this short-circuits to a well-formed empty
/// output; that is a success, not an error.
pub fn aggregate(
    features: &[ObjectFeatures],
    predictions: Vec<ClassificationResult>,
    skipped: Vec<SkippedObject>,
) -> PipelineOutput {
    debug_assert_eq!(features.len(), predictions.len());

    let mut class_counts = BTreeMap::new();
    for prediction in &predictions {
        *class_counts.entry(prediction.predicted_class).or_insert(0) += 1;
    }

    PipelineOutput {
        object_count: predictions.len(),
        class_counts,
        predictions,
        skipped,
    }
}

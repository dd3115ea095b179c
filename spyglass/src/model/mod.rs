//! Trained model artifacts: classifier, imputer, and schema.
//!
//! The artifacts are produced by an external training procedure and treated
//! as opaque, read-only inputs here. Everything is loaded once into a
//! [`ModelContext`] at startup and shared immutably for the rest of the
//! process lifetime; concurrent inference never mutates shared state.
//!
//! # Artifact files
//!
//! A model directory holds four serde-JSON files:
//!
//! - `classifier.json`: [`forest::DecisionForest`]
//! - `imputer.json`: [`imputer::MedianImputer`]
//! - `feature_names.json`: ordered column schema the classifier was trained on
//! - `class_names.json`: class labels in the classifier's output order

pub mod forest;
pub mod imputer;

use ndarray::{Array2, ArrayView2};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

use crate::class::ObjectClass;
use crate::error::{ClassifyError, ModelError};
use crate::model::forest::DecisionForest;
use crate::model::imputer::MedianImputer;

/// Inference interface a trained classifier must expose.
///
/// `predict` returns one index into the model's class ordering per input
/// row. `predict_proba` returns per-class probabilities in that same
/// ordering, or `None` when the underlying model cannot produce them; the
/// pipeline then degrades to label-only predictions instead of failing.
pub trait ClassifierModel: Send + Sync {
    /// Number of feature columns the model was trained on.
    fn feature_count(&self) -> usize;

    /// Number of classes the model can emit.
    fn class_count(&self) -> usize;

    /// Predict a class index for every row of the matrix.
    fn predict(&self, matrix: &ArrayView2<f64>) -> Result<Vec<usize>, ClassifyError>;

    /// Per-class probabilities for every row, if the model supports them.
    fn predict_proba(&self, matrix: &ArrayView2<f64>) -> Option<Array2<f64>>;
}

/// Immutable bundle of trained model artifacts.
///
/// Constructed once at process start and passed by shared reference into
/// every pipeline invocation; there is no process-global model state.
pub struct ModelContext {
    feature_names: Vec<String>,
    class_names: Vec<ObjectClass>,
    imputer: MedianImputer,
    classifier: Box<dyn ClassifierModel>,
}

impl ModelContext {
    /// Assemble a context from its parts, validating schema consistency up
    /// front so classification itself cannot hit a misaligned model.
    pub fn new(
        feature_names: Vec<String>,
        class_names: Vec<ObjectClass>,
        imputer: MedianImputer,
        classifier: Box<dyn ClassifierModel>,
    ) -> Result<Self, ModelError> {
        if classifier.feature_count() != feature_names.len() {
            return Err(ModelError::FeatureCountMismatch {
                classifier: classifier.feature_count(),
                schema: feature_names.len(),
            });
        }
        if classifier.class_count() != class_names.len() {
            return Err(ModelError::ClassCountMismatch {
                classifier: classifier.class_count(),
                names: class_names.len(),
            });
        }
        if imputer.width() != feature_names.len() {
            return Err(ModelError::ImputerWidthMismatch {
                imputer: imputer.width(),
                schema: feature_names.len(),
            });
        }

        Ok(Self {
            feature_names,
            class_names,
            imputer,
            classifier,
        })
    }

    /// Load all artifacts from a model directory.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        let forest: DecisionForest = read_artifact(&dir.join("classifier.json"))?;
        forest.validate()?;
        let imputer: MedianImputer = read_artifact(&dir.join("imputer.json"))?;
        let feature_names: Vec<String> = read_artifact(&dir.join("feature_names.json"))?;
        let class_names: Vec<ObjectClass> = read_artifact(&dir.join("class_names.json"))?;

        info!(
            features = feature_names.len(),
            classes = class_names.len(),
            trees = forest.trees.len(),
            "model artifacts loaded"
        );

        Self::new(feature_names, class_names, imputer, Box::new(forest))
    }

    /// Ordered column schema the classifier expects.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Class labels in the classifier's output order.
    pub fn class_names(&self) -> &[ObjectClass] {
        &self.class_names
    }

    /// The pre-fitted imputation step.
    pub fn imputer(&self) -> &MedianImputer {
        &self.imputer
    }

    /// The trained classifier.
    pub fn classifier(&self) -> &dyn ClassifierModel {
        self.classifier.as_ref()
    }
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("feature_names", &self.feature_names)
            .field("class_names", &self.class_names)
            .finish_non_exhaustive()
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let text = std::fs::read_to_string(path).map_err(|source| ModelError::ArtifactRead {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ModelError::ArtifactParse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::forest::{DecisionTree, TreeNode};

    fn leaf_forest(n_features: usize, n_classes: usize) -> DecisionForest {
        DecisionForest {
            n_features,
            n_classes,
            trees: vec![DecisionTree {
                nodes: vec![TreeNode::Leaf {
                    distribution: vec![1.0; n_classes],
                }],
            }],
        }
    }

    #[test]
    fn test_context_rejects_feature_count_mismatch() {
        let result = ModelContext::new(
            vec!["area".into()],
            vec![ObjectClass::Star, ObjectClass::Noise],
            MedianImputer::new(vec![0.0]),
            Box::new(leaf_forest(2, 2)),
        );
        assert!(matches!(
            result,
            Err(ModelError::FeatureCountMismatch { classifier: 2, schema: 1 })
        ));
    }

    #[test]
    fn test_context_rejects_class_count_mismatch() {
        let result = ModelContext::new(
            vec!["area".into(), "perimeter".into()],
            vec![ObjectClass::Star],
            MedianImputer::new(vec![0.0, 0.0]),
            Box::new(leaf_forest(2, 2)),
        );
        assert!(matches!(result, Err(ModelError::ClassCountMismatch { .. })));
    }

    #[test]
    fn test_context_rejects_imputer_width_mismatch() {
        let result = ModelContext::new(
            vec!["area".into(), "perimeter".into()],
            vec![ObjectClass::Star, ObjectClass::Noise],
            MedianImputer::new(vec![0.0]),
            Box::new(leaf_forest(2, 2)),
        );
        assert!(matches!(result, Err(ModelError::ImputerWidthMismatch { .. })));
    }

    #[test]
    fn test_context_accepts_consistent_artifacts() {
        let context = ModelContext::new(
            vec!["area".into(), "perimeter".into()],
            vec![ObjectClass::Star, ObjectClass::Noise],
            MedianImputer::new(vec![0.0, 0.0]),
            Box::new(leaf_forest(2, 2)),
        )
        .unwrap();
        assert_eq!(context.feature_names().len(), 2);
        assert_eq!(context.class_names()[1], ObjectClass::Noise);
    }
}

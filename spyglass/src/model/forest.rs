//! Decision-forest classifier loaded from serialized artifacts.
//!
//! Trees are stored as flat node arrays the way ensemble exporters emit
//! them: split nodes carry a feature index, threshold and child indices;
//! leaves carry a class-count histogram. Prediction averages the normalized
//! leaf histograms across trees, so per-class probabilities are always
//! available for this model.

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, ModelError};
use crate::model::ClassifierModel;

/// One node of a flattened decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Internal split: rows with `value <= threshold` descend left.
    Split {
        /// Feature column tested at this node.
        feature: usize,
        /// Split threshold.
        threshold: f64,
        /// Node index for the left branch.
        left: usize,
        /// Node index for the right branch.
        right: usize,
    },
    /// Terminal node holding per-class sample counts from training.
    Leaf {
        /// Class-count histogram, indexed like the model's class ordering.
        distribution: Vec<f64>,
    },
}

/// A single flattened decision tree; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Flat node storage; children always come after their parent.
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk the tree for one feature row and return the leaf histogram.
    fn leaf_distribution(&self, row: &ArrayView1<f64>) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { distribution } => return distribution,
            }
        }
    }

    fn validate(&self, tree: usize, n_features: usize, n_classes: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::MalformedTree {
                tree,
                detail: "tree has no nodes".into(),
            });
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(ModelError::MalformedTree {
                            tree,
                            detail: format!(
                                "node {index} tests feature {feature}, model has {n_features}"
                            ),
                        });
                    }
                    // Forward-only children also rule out cycles
                    for &child in [left, right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(ModelError::MalformedTree {
                                tree,
                                detail: format!("node {index} has invalid child {child}"),
                            });
                        }
                    }
                }
                TreeNode::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(ModelError::MalformedTree {
                            tree,
                            detail: format!(
                                "leaf {index} has {} classes, model has {n_classes}",
                                distribution.len()
                            ),
                        });
                    }
                    if distribution.iter().sum::<f64>() <= 0.0 {
                        return Err(ModelError::MalformedTree {
                            tree,
                            detail: format!("leaf {index} has an empty distribution"),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Ensemble of decision trees with averaged class probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionForest {
    /// Feature columns the forest was trained on.
    pub n_features: usize,
    /// Classes the forest can emit.
    pub n_classes: usize,
    /// The ensemble members.
    pub trees: Vec<DecisionTree>,
}

impl DecisionForest {
    /// Validate structural integrity of every tree.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index, self.n_features, self.n_classes)?;
        }
        Ok(())
    }

    /// Mean of the normalized leaf histograms over all trees, one row of
    /// class probabilities per input row.
    fn probabilities(&self, matrix: &ArrayView2<f64>) -> Array2<f64> {
        let rows = matrix.nrows();
        let mut probabilities = Array2::zeros((rows, self.n_classes));

        for (row_index, row) in matrix.rows().into_iter().enumerate() {
            for tree in &self.trees {
                let distribution = tree.leaf_distribution(&row);
                let total: f64 = distribution.iter().sum();
                for (class, &count) in distribution.iter().enumerate() {
                    probabilities[[row_index, class]] += count / total;
                }
            }
            for class in 0..self.n_classes {
                probabilities[[row_index, class]] /= self.trees.len() as f64;
            }
        }

        probabilities
    }
}

impl ClassifierModel for DecisionForest {
    fn feature_count(&self) -> usize {
        self.n_features
    }

    fn class_count(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, matrix: &ArrayView2<f64>) -> Result<Vec<usize>, ClassifyError> {
        if matrix.nrows() == 0 {
            return Err(ClassifyError::EmptyFeatureMatrix);
        }
        if matrix.ncols() != self.n_features {
            return Err(ClassifyError::SchemaMismatch {
                expected: self.n_features,
                got: matrix.ncols(),
            });
        }

        let probabilities = self.probabilities(matrix);
        let labels = probabilities
            .rows()
            .into_iter()
            .map(|row| {
                // First maximum wins ties, matching the class ordering
                let mut best = 0;
                for (class, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = class;
                    }
                }
                best
            })
            .collect();

        Ok(labels)
    }

    fn predict_proba(&self, matrix: &ArrayView2<f64>) -> Option<Array2<f64>> {
        if matrix.nrows() == 0 || matrix.ncols() != self.n_features {
            return None;
        }
        Some(self.probabilities(matrix))
    }
}

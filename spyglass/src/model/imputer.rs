//! Pre-fitted median imputation for the aligned feature matrix.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;

/// Replaces missing or non-finite cells with per-column medians fitted
/// during training.
///
/// Degenerate geometry can leave NaN or infinite values in a feature row
/// (the schema-alignment step already turns absent fields into 0); this step
/// guarantees the classifier only ever sees finite numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedianImputer {
    medians: Vec<f64>,
}

impl MedianImputer {
    /// Build an imputer from pre-fitted per-column medians.
    pub fn new(medians: Vec<f64>) -> Self {
        Self { medians }
    }

    /// Number of columns this imputer was fitted on.
    pub fn width(&self) -> usize {
        self.medians.len()
    }

    /// Replace every non-finite cell with its column median, in place.
    pub fn transform(&self, matrix: &mut Array2<f64>) -> Result<(), ClassifyError> {
        if matrix.ncols() != self.medians.len() {
            return Err(ClassifyError::SchemaMismatch {
                expected: self.medians.len(),
                got: matrix.ncols(),
            });
        }

        for mut row in matrix.rows_mut() {
            for (column, value) in row.iter_mut().enumerate() {
                if !value.is_finite() {
                    *value = self.medians[column];
                }
            }
        }

        Ok(())
    }
}
